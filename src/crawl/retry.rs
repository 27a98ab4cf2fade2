//! Navigation retry policy

use crate::core::{DifferError, NavigationErrorKind, NavigationOutcome};

/// How hard a page visit tries before giving up on capture.
///
/// Unsuccessful loads are re-navigated immediately, without backoff, up to
/// `max_retries` times. Errors in one of the `bonus_on` categories earn a
/// single extra attempt outside that loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: usize,
    bonus_on: Vec<NavigationErrorKind>,
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            bonus_on: vec![
                NavigationErrorKind::TargetClosed,
                NavigationErrorKind::Timeout,
                NavigationErrorKind::NameNotResolved,
            ],
        }
    }

    /// Replace the error categories that earn the extra attempt
    pub fn with_bonus_on(mut self, kinds: Vec<NavigationErrorKind>) -> Self {
        self.bonus_on = kinds;
        self
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Whether to navigate again after `retries_done` retries ended in `outcome`
    pub fn should_retry(&self, outcome: &NavigationOutcome, retries_done: usize) -> bool {
        !outcome.is_ok() && retries_done < self.max_retries
    }

    /// Whether `error` earns the extra attempt
    pub fn grants_bonus(&self, error: &DifferError) -> bool {
        error
            .navigation_kind()
            .is_some_and(|kind| self.bonus_on.contains(&kind))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_failed_loads_up_to_bound() {
        let policy = RetryPolicy::default();
        let failed = NavigationOutcome::with_status(500);
        assert!(policy.should_retry(&failed, 0));
        assert!(policy.should_retry(&failed, 4));
        assert!(!policy.should_retry(&failed, 5));
    }

    #[test]
    fn test_never_retries_success() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(&NavigationOutcome::with_status(200), 0));
        assert!(!policy.should_retry(&NavigationOutcome::unknown(), 0));
    }

    #[test]
    fn test_zero_retries() {
        let policy = RetryPolicy::new(0);
        assert!(!policy.should_retry(&NavigationOutcome::with_status(404), 0));
    }

    #[test]
    fn test_bonus_categories() {
        let policy = RetryPolicy::default();
        assert!(policy.grants_bonus(&DifferError::navigation("u", "Target closed")));
        assert!(policy.grants_bonus(&DifferError::navigation("u", "net::ERR_NAME_NOT_RESOLVED")));
        assert!(policy.grants_bonus(&DifferError::capture("Navigation timeout of 30000 ms exceeded")));
        assert!(!policy.grants_bonus(&DifferError::navigation("u", "net::ERR_ABORTED")));
        assert!(!policy.grants_bonus(&DifferError::config("Target closed")));
    }

    #[test]
    fn test_custom_bonus_categories() {
        let policy = RetryPolicy::default().with_bonus_on(vec![NavigationErrorKind::Other]);
        assert!(policy.grants_bonus(&DifferError::navigation("u", "net::ERR_ABORTED")));
        assert!(!policy.grants_bonus(&DifferError::navigation("u", "Target closed")));
    }
}
