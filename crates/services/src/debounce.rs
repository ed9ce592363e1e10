//! Temporal exclusion helpers: a settle gate that rejects repeats inside a
//! window, and a debouncer that keeps one pending delayed action per key.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;

/// Rejects a second request for the same key until `window` has passed.
///
/// Rejected requests are dropped, not queued, and do not extend the window.
#[derive(Debug, Clone)]
pub struct SettleGate<K> {
    window: Duration,
    accepted_at: HashMap<K, DateTime<Utc>>,
}

impl<K: Eq + Hash + Clone> SettleGate<K> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            accepted_at: HashMap::new(),
        }
    }

    /// Returns `true` if the request is accepted, recording `now` for `key`.
    pub fn try_acquire(&mut self, key: &K, now: DateTime<Utc>) -> bool {
        if let Some(&last) = self.accepted_at.get(key) {
            if now.signed_duration_since(last) < self.window {
                return false;
            }
        }
        self.accepted_at.insert(key.clone(), now);
        true
    }
}

/// Delays an action until input settles; scheduling again for the same key
/// cancels the pending one.
#[derive(Debug)]
pub struct Debouncer<K: Eq + Hash> {
    delay: StdDuration,
    pending: HashMap<K, JoinHandle<()>>,
}

impl<K: Eq + Hash> Debouncer<K> {
    #[must_use]
    pub fn new(delay: StdDuration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    /// Run `action` after the delay unless another action is scheduled for `key` first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, key: K, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.pending.remove(&key) {
            previous.abort();
        }
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        self.pending.insert(key, handle);
    }

    /// Cancel the pending action for `key`. Returns whether one was still waiting.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.pending.remove(key) {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.get(key).is_some_and(|handle| !handle.is_finished())
    }
}

impl<K: Eq + Hash> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::time::fixed_now;
    use std::sync::{Arc, Mutex};

    #[test]
    fn gate_rejects_inside_window_and_reopens_after() {
        let mut gate = SettleGate::new(Duration::milliseconds(500));
        let now = fixed_now();

        assert!(gate.try_acquire(&"42", now));
        assert!(!gate.try_acquire(&"42", now + Duration::milliseconds(499)));
        assert!(gate.try_acquire(&"7", now));
        assert!(gate.try_acquire(&"42", now + Duration::milliseconds(500)));
    }

    #[test]
    fn rejected_requests_do_not_extend_the_window() {
        let mut gate = SettleGate::new(Duration::milliseconds(500));
        let now = fixed_now();

        assert!(gate.try_acquire(&1, now));
        assert!(!gate.try_acquire(&1, now + Duration::milliseconds(400)));
        assert!(gate.try_acquire(&1, now + Duration::milliseconds(600)));
    }

    #[tokio::test(start_paused = true)]
    async fn debouncer_runs_only_the_last_action_per_key() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(StdDuration::from_millis(300));

        for term in ["tw", "two", "two s"] {
            let fired = Arc::clone(&fired);
            debouncer.schedule("search", async move {
                fired.lock().unwrap().push(term);
            });
            tokio::time::sleep(StdDuration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending(&"search"));

        tokio::time::sleep(StdDuration::from_millis(300)).await;
        assert_eq!(*fired.lock().unwrap(), vec!["two s"]);
        assert!(!debouncer.is_pending(&"search"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_action_never_runs() {
        let fired = Arc::new(Mutex::new(false));
        let mut debouncer = Debouncer::new(StdDuration::from_millis(300));

        let flag = Arc::clone(&fired);
        debouncer.schedule(1_u8, async move {
            *flag.lock().unwrap() = true;
        });
        assert!(debouncer.cancel(&1));

        tokio::time::sleep(StdDuration::from_secs(1)).await;
        assert!(!*fired.lock().unwrap());
    }
}
