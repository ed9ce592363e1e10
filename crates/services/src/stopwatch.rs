use chrono::{DateTime, Duration, Utc};

/// Elapsed-time display for the current card.
///
/// Purely derived state: it never ticks on its own, the display samples it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    running_since: Option<DateTime<Utc>>,
    accumulated: Duration,
}

impl Stopwatch {
    /// Zero the stopwatch and start counting from `now`.
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.accumulated = Duration::zero();
        self.running_since = Some(now);
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += clamp(now.signed_duration_since(since));
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Pause if running, resume otherwise. Returns whether it is now running.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_running() {
            self.pause(now);
        } else {
            self.resume(now);
        }
        self.is_running()
    }

    /// Stop and zero.
    pub fn reset(&mut self) {
        self.running_since = None;
        self.accumulated = Duration::zero();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let running = self
            .running_since
            .map_or_else(Duration::zero, |since| clamp(now.signed_duration_since(since)));
        self.accumulated + running
    }

    /// `MM:SS`, minutes uncapped.
    #[must_use]
    pub fn display(&self, now: DateTime<Utc>) -> String {
        let secs = self.elapsed(now).num_seconds();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

fn clamp(delta: Duration) -> Duration {
    delta.max(Duration::zero())
}
