//! Progress reporting and cancellation for long-running constructions.
//!
//! Every algorithm announces its number of outer iterations with
//! `set_maximum` and calls `increment_progress` once per iteration. The call
//! doubles as the cancellation check: an `Err(SplitsError::Cancelled)` is
//! returned to the caller immediately and the partial result is dropped.

use crate::error::{Result, SplitsError};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait ProgressListener {
    fn set_maximum(&mut self, maximum: usize);

    /// Advances by one step; fails with `SplitsError::Cancelled` when
    /// cancellation was requested.
    fn increment_progress(&mut self) -> Result<()>;

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Listener that ignores progress and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn set_maximum(&mut self, _maximum: usize) {}

    fn increment_progress(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Listener that logs progress at debug level and honours a shared cancel flag.
#[derive(Debug)]
pub struct ProgressLog {
    task: String,
    maximum: usize,
    current: usize,
    last_percent: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl ProgressLog {
    pub fn new(task: impl Into<String>) -> Self {
        ProgressLog {
            task: task.into(),
            maximum: 0,
            current: 0,
            last_percent: 0,
            cancel: None,
        }
    }

    /// Cancel the computation once `flag` is set, e.g. from another thread.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn current(&self) -> usize {
        self.current
    }
}

impl ProgressListener for ProgressLog {
    fn set_maximum(&mut self, maximum: usize) {
        self.maximum = maximum;
        self.current = 0;
        self.last_percent = 0;
        debug!("{}: {} steps", self.task, maximum);
    }

    fn increment_progress(&mut self) -> Result<()> {
        if self.is_cancelled() {
            debug!("{}: cancelled at step {}", self.task, self.current);
            return Err(SplitsError::Cancelled);
        }
        self.current += 1;
        if self.maximum > 0 {
            let percent = 100 * self.current / self.maximum;
            if percent >= self.last_percent + 10 {
                self.last_percent = percent - percent % 10;
                debug!("{}: {}%", self.task, self.last_percent);
            }
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress_never_cancels() {
        let mut progress = NoProgress;
        progress.set_maximum(3);
        assert!(progress.increment_progress().is_ok());
        assert!(!progress.is_cancelled());
    }

    #[test]
    fn test_cancel_flag_stops_increment() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut progress = ProgressLog::new("test").with_cancel_flag(flag.clone());
        progress.set_maximum(10);
        progress.increment_progress().unwrap();
        assert_eq!(progress.current(), 1);

        flag.store(true, Ordering::Relaxed);
        assert!(matches!(progress.increment_progress(), Err(SplitsError::Cancelled)));
        assert_eq!(progress.current(), 1);
    }
}
