//! Progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Receives per-spectrum progress and answers cancellation requests.
///
/// Implementations are shared by the workers of a parallel loop.
pub trait Progress: Send + Sync {
    /// Called once per processed spectrum.
    fn report(&self);

    /// Polled before each spectrum.
    fn is_cancelled(&self) -> bool;
}

/// Ignores reports, never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn report(&self) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Counts reports and cancels on request, or automatically after a fixed
/// number of reports.
#[derive(Debug, Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    reports: AtomicUsize,
    cancel_after: Option<usize>,
}

impl CancellationToken {
    /// A token that only cancels when [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that cancels itself once `reports` spectra were reported.
    #[must_use]
    pub fn cancel_after(reports: usize) -> Self {
        Self {
            cancel_after: Some(reports),
            ..Self::default()
        }
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Number of reports received.
    #[must_use]
    pub fn reports(&self) -> usize {
        self.reports.load(Ordering::Acquire)
    }
}

impl Progress for CancellationToken {
    fn report(&self) {
        let seen = self.reports.fetch_add(1, Ordering::AcqRel) + 1;
        if self.cancel_after.is_some_and(|limit| seen >= limit) {
            self.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_after_reports() {
        let token = CancellationToken::cancel_after(2);
        token.report();
        assert!(!token.is_cancelled());
        token.report();
        assert!(token.is_cancelled());
        assert_eq!(token.reports(), 2);
    }

    #[test]
    fn test_manual_cancel() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        assert!(!NullProgress.is_cancelled());
    }
}
