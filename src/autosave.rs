//! Autosave debouncing.
//!
//! Model mutations mark the state dirty; a save actually happens only once
//! the edits quiesce for the debounce window, so bursts of edits coalesce
//! into one write. A failed save keeps the dirty flag set, so the next
//! mutation (or the next poll) retries.

use std::time::{Duration, Instant};

/// Quiescence window before a save fires
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Debounced autosave state
#[derive(Debug)]
pub struct Autosave {
    dirty: bool,
    last_change: Instant,
    window: Duration,
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new()
    }
}

impl Autosave {
    pub fn new() -> Self {
        Self::with_window(AUTOSAVE_DEBOUNCE)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            dirty: false,
            last_change: Instant::now(),
            window,
        }
    }

    /// Record a model mutation
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.last_change = Instant::now();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True once there are unsaved changes and the window has elapsed
    pub fn due(&self) -> bool {
        self.dirty && self.last_change.elapsed() >= self.window
    }

    /// Run the save if one is due. The dirty flag clears only on success.
    pub fn flush_if_due<F, E>(&mut self, save: F) -> Option<Result<(), E>>
    where
        F: FnOnce() -> Result<(), E>,
    {
        if !self.due() {
            return None;
        }
        let result = save();
        if result.is_ok() {
            self.dirty = false;
        }
        Some(result)
    }

    /// Flush unconditionally if dirty (shutdown path)
    pub fn flush<F, E>(&mut self, save: F) -> Option<Result<(), E>>
    where
        F: FnOnce() -> Result<(), E>,
    {
        if !self.dirty {
            return None;
        }
        let result = save();
        if result.is_ok() {
            self.dirty = false;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clean_state_never_due() {
        let autosave = Autosave::new();
        assert!(!autosave.due());
    }

    #[test]
    fn test_due_after_window() {
        let mut autosave = Autosave::with_window(Duration::from_millis(10));
        autosave.mark_dirty();
        assert!(!autosave.due());

        thread::sleep(Duration::from_millis(15));
        assert!(autosave.due());
    }

    #[test]
    fn test_mutations_coalesce() {
        let mut autosave = Autosave::with_window(Duration::from_millis(20));
        autosave.mark_dirty();
        thread::sleep(Duration::from_millis(12));
        // A second mutation inside the window restarts it
        autosave.mark_dirty();
        thread::sleep(Duration::from_millis(12));
        assert!(!autosave.due());

        thread::sleep(Duration::from_millis(12));
        assert!(autosave.due());
    }

    #[test]
    fn test_flush_clears_dirty_on_success() {
        let mut autosave = Autosave::with_window(Duration::from_millis(0));
        autosave.mark_dirty();

        let result = autosave.flush_if_due(|| Ok::<(), ()>(()));
        assert!(matches!(result, Some(Ok(()))));
        assert!(!autosave.is_dirty());
    }

    #[test]
    fn test_failed_save_stays_dirty() {
        let mut autosave = Autosave::with_window(Duration::from_millis(0));
        autosave.mark_dirty();

        let result = autosave.flush_if_due(|| Err::<(), &str>("disk full"));
        assert!(matches!(result, Some(Err(_))));
        assert!(autosave.is_dirty());
    }

    #[test]
    fn test_shutdown_flush_ignores_window() {
        let mut autosave = Autosave::new();
        autosave.mark_dirty();

        // Window hasn't elapsed, but shutdown flushes anyway
        let result = autosave.flush(|| Ok::<(), ()>(()));
        assert!(matches!(result, Some(Ok(()))));
        assert!(!autosave.is_dirty());
    }

    #[test]
    fn test_flush_when_clean_is_noop() {
        let mut autosave = Autosave::new();
        let result = autosave.flush(|| Ok::<(), ()>(()));
        assert!(result.is_none());
    }
}
