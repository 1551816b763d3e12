//! Supervision decisions returned by actor callbacks.
//!
//! These are plain values. An actor never reaches back into its mailbox after a failure;
//! it answers [`Actor::on_init_failure`](crate::Actor::on_init_failure) or
//! [`Actor::on_process_failure`](crate::Actor::on_process_failure) and the mailbox acts on it.

use std::time::Duration;

/// What to do after `init` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitFailureStrategy {
    Stop,
    RetryImmediately,
    RetryWithDelay(Duration),
}

impl InitFailureStrategy {
    pub fn stop() -> Self {
        InitFailureStrategy::Stop
    }

    pub fn retry_immediately() -> Self {
        InitFailureStrategy::RetryImmediately
    }

    /// Retry after `delay_ms`. A zero delay is the same as [`retry_immediately`](Self::retry_immediately).
    pub fn retry_with_delay(delay_ms: u64) -> Self {
        if delay_ms == 0 {
            InitFailureStrategy::RetryImmediately
        } else {
            InitFailureStrategy::RetryWithDelay(Duration::from_millis(delay_ms))
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, InitFailureStrategy::Stop)
    }

    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            InitFailureStrategy::RetryWithDelay(delay) => Some(*delay),
            _ => None,
        }
    }
}

/// What to do after `process` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessFailureStrategy {
    Stop,
    Resume,
}

impl ProcessFailureStrategy {
    pub fn stop() -> Self {
        ProcessFailureStrategy::Stop
    }

    pub fn resume() -> Self {
        ProcessFailureStrategy::Resume
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, ProcessFailureStrategy::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_delay_means_immediate_retry() {
        assert_eq!(
            InitFailureStrategy::retry_with_delay(0),
            InitFailureStrategy::retry_immediately()
        );
        assert_eq!(InitFailureStrategy::retry_immediately().retry_delay(), None);
    }

    #[test]
    fn test_delayed_retry_keeps_its_delay() {
        let strategy = InitFailureStrategy::retry_with_delay(250);
        assert!(!strategy.is_stop());
        assert_eq!(strategy.retry_delay(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_stop_flags() {
        assert!(InitFailureStrategy::stop().is_stop());
        assert!(ProcessFailureStrategy::stop().is_stop());
        assert!(!ProcessFailureStrategy::resume().is_stop());
    }
}
