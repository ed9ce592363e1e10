/// Cursor position within the current pass, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// Problems already handled in this pass.
    pub cursor: usize,
    pub total: usize,
    /// 1-based pass number within the session.
    pub pass: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Fraction of the pass done, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.cursor as f64 / self.total as f64
    }
}
