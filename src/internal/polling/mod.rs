//! Visibility-aware polling for new feed posts.
//!
//! A [`NewPostsPoller`] owns a repeating timer that asks a [`CheckNewPosts`]
//! source how many new posts exist. Checks only run while the host is visible
//! (terminal focused) and enabled, at most one at a time, and stop after
//! `max_retries` consecutive failures until the owner calls
//! [`PollerHandle::reset_new_posts`].
//!
//! There is no backoff: failed checks are retried at the same fixed interval
//! and the breaker trips at a fixed threshold.

mod controller;
pub mod visibility;

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use strum_macros::Display;
use thiserror::Error;

pub use controller::{NewPostsPoller, PollerHandle};
pub use visibility::{FocusVisibility, Visibility, VisibilitySource};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Source of the "how many new posts?" answer.
///
/// An `Err` is a transient failure: it is counted, logged and never surfaced
/// to the host.
pub trait CheckNewPosts: Send + Sync + 'static {
    fn check_new_posts(&self) -> BoxFuture<'_, anyhow::Result<u64>>;
}

impl<F, Fut> CheckNewPosts for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<u64>> + Send + 'static,
{
    fn check_new_posts(&self) -> BoxFuture<'_, anyhow::Result<u64>> {
        Box::pin((self)())
    }
}

/// Errors rejected when building a poller.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("polling interval must be greater than zero")]
    ZeroInterval,

    #[error("max_retries must be at least 1")]
    ZeroRetries,

    #[error("no check function was provided")]
    MissingCheck,
}

/// Timing and gating knobs for a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub enabled: bool,
    pub max_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            enabled: true,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl PollConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.interval.is_zero() {
            return Err(ConfigurationError::ZeroInterval);
        }
        if self.max_retries == 0 {
            return Err(ConfigurationError::ZeroRetries);
        }
        Ok(())
    }
}

/// Where the poller currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum PollPhase {
    /// No timer armed: disabled, hidden, or waiting on nothing.
    #[default]
    Idle,
    /// Timer armed; the next check fires after the interval.
    Scheduled,
    /// A check is in flight.
    Checking,
    /// Too many consecutive failures; nothing runs until reset.
    Paused,
}

/// State owned by the poller task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollState {
    pub pending_count: u64,
    pub is_tab_visible: bool,
    pub consecutive_failures: u32,
}

impl PollState {
    /// Apply the outcome of one check. Returns true when this outcome trips
    /// the breaker.
    pub(crate) fn record(&mut self, outcome: &anyhow::Result<u64>, max_retries: u32) -> bool {
        match outcome {
            Ok(count) => {
                // A zero answer leaves an unconsumed count in place.
                if *count > 0 {
                    self.pending_count = *count;
                }
                self.consecutive_failures = 0;
                false
            }
            Err(_) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.consecutive_failures == max_retries
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.pending_count = 0;
        self.consecutive_failures = 0;
    }

    pub(crate) fn exhausted(&self, max_retries: u32) -> bool {
        self.consecutive_failures >= max_retries
    }
}

/// What the host reads reactively to render the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollSnapshot {
    pub pending_count: u64,
    pub is_tab_visible: bool,
    pub consecutive_failures: u32,
    pub phase: PollPhase,
}

impl PollSnapshot {
    pub fn is_paused(&self) -> bool {
        self.phase == PollPhase::Paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_values() {
        let zero_interval = PollConfig {
            interval: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(
            zero_interval.validate(),
            Err(ConfigurationError::ZeroInterval)
        );

        let zero_retries = PollConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(
            zero_retries.validate(),
            Err(ConfigurationError::ZeroRetries)
        );
    }

    #[test]
    fn test_zero_result_keeps_pending_count() {
        let mut state = PollState::default();
        state.record(&Ok(5), 3);
        state.record(&Ok(0), 3);
        assert_eq!(state.pending_count, 5);

        state.record(&Ok(2), 3);
        assert_eq!(state.pending_count, 2);
    }

    #[test]
    fn test_failures_trip_once_at_threshold() {
        let mut state = PollState::default();
        assert!(!state.record(&Err(anyhow::anyhow!("boom")), 3));
        assert!(!state.record(&Err(anyhow::anyhow!("boom")), 3));
        assert!(state.record(&Err(anyhow::anyhow!("boom")), 3));
        assert!(state.exhausted(3));

        state.reset();
        assert_eq!(state.consecutive_failures, 0);
        assert_eq!(state.pending_count, 0);
        assert!(!state.exhausted(3));
    }

    #[test]
    fn test_success_clears_failures() {
        let mut state = PollState::default();
        state.record(&Err(anyhow::anyhow!("timeout")), 3);
        state.record(&Err(anyhow::anyhow!("timeout")), 3);
        state.record(&Ok(0), 3);
        assert_eq!(state.consecutive_failures, 0);
    }
}
