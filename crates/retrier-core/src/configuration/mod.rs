//! Retry configuration.
//!
//! A `Configuration` bundles the retry budget, the retriable failure kinds,
//! the two hooks, and the backoff table. Every mutation goes through a
//! validating setter, so a value that exists always satisfies
//! `backoff_intervals.len() >= retries`. Per-call changes are expressed as
//! `Overrides` and applied with `merge`, which returns a fresh value.

pub mod global;
mod merge;
mod overrides;

pub use overrides::{ConfigKey, Override, Overrides};
pub(crate) use overrides::resolve_kinds;

use crate::backoff::{BackoffKind, BackoffStrategy, DEFAULT_TABLE_LEN};
use crate::error::ConfigError;
use crate::retry::{kinds, Failure, FailureKind};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Suppression predicate: returning `true` stops retrying even though budget remains.
pub type RetryCondition = Arc<dyn Fn(&dyn Failure) -> bool + Send + Sync>;

/// Called with the failure and the retries still left, right before each backoff wait.
pub type OnRetry = Arc<dyn Fn(&dyn Failure, u32) + Send + Sync>;

pub const DEFAULT_RETRIES: u32 = 3;
/// Default constant backoff, in seconds.
pub const DEFAULT_BACKOFF_START: u64 = 3;

/// Why the engine stopped retrying a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Failure kind is not in the retriable set.
    NonRetriable,
    /// The retry condition asked to stop.
    Suppressed,
    /// No retries left.
    Exhausted,
}

/// Decision for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Propagate the failure as is.
    Stop(StopReason),
    /// Retry after the given delay.
    RetryAfter(Duration),
}

#[derive(Clone)]
pub struct Configuration {
    retries: u32,
    retriable: Vec<FailureKind>,
    retry_condition: RetryCondition,
    on_retry: OnRetry,
    backoff_intervals: Vec<Duration>,
    /// Strategy the current table was generated from; `None` once the table
    /// has been set directly.
    backoff: Option<BackoffStrategy>,
}

impl Default for Configuration {
    fn default() -> Self {
        let backoff = BackoffStrategy::new(BackoffKind::Constant, DEFAULT_BACKOFF_START);
        Self {
            retries: DEFAULT_RETRIES,
            retriable: vec![kinds::HTTP_RETRIABLE, kinds::CONNECTION_RESET, kinds::IO],
            retry_condition: Arc::new(|_: &dyn Failure| false),
            on_retry: Arc::new(|_: &dyn Failure, _: u32| {}),
            backoff_intervals: vec![Duration::from_secs(DEFAULT_BACKOFF_START); DEFAULT_TABLE_LEN],
            backoff: Some(backoff),
        }
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("retries", &self.retries)
            .field("retriable", &self.retriable)
            .field("backoff_intervals", &self.backoff_intervals)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Configuration {
    /// Built-in defaults with `overrides` applied.
    pub fn new(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::default().merge(overrides)
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn retriable(&self) -> &[FailureKind] {
        &self.retriable
    }

    pub fn backoff_intervals(&self) -> &[Duration] {
        &self.backoff_intervals
    }

    pub fn backoff_strategy(&self) -> Option<BackoffStrategy> {
        self.backoff
    }

    pub fn retry_condition(&self) -> &RetryCondition {
        &self.retry_condition
    }

    pub fn on_retry(&self) -> &OnRetry {
        &self.on_retry
    }

    /// Set the retry budget. The current table must already cover it; use
    /// [`Configuration::declare_backoff_strategy_for`] to grow both at once.
    pub fn set_retries(&mut self, retries: u32) -> Result<(), ConfigError> {
        if retries == 0 {
            return Err(ConfigError::invalid("retries", "must be positive integer"));
        }
        merge::check_table_len(self.backoff_intervals.len(), retries)?;
        self.retries = retries;
        Ok(())
    }

    pub fn set_retriable(&mut self, kinds: Vec<FailureKind>) {
        self.retriable = kinds;
    }

    pub fn set_retry_condition<F>(&mut self, condition: F)
    where
        F: Fn(&dyn Failure) -> bool + Send + Sync + 'static,
    {
        self.retry_condition = Arc::new(condition);
    }

    pub fn set_on_retry<F>(&mut self, hook: F)
    where
        F: Fn(&dyn Failure, u32) + Send + Sync + 'static,
    {
        self.on_retry = Arc::new(hook);
    }

    /// Replace the backoff table directly.
    pub fn set_backoff_intervals(&mut self, intervals: Vec<Duration>) -> Result<(), ConfigError> {
        merge::check_table_len(intervals.len(), self.retries)?;
        self.backoff_intervals = intervals;
        self.backoff = None;
        Ok(())
    }

    /// Regenerate the backoff table from `strategy` for the current budget.
    pub fn declare_backoff_strategy(&mut self, strategy: BackoffStrategy) -> Result<(), ConfigError> {
        self.declare_backoff_strategy_for(strategy, self.retries)
    }

    /// Set the budget and regenerate the table from `strategy` in one step.
    ///
    /// The table is padded to ten entries when the strategy can produce
    /// them, so a later budget up to ten fits without redeclaring.
    pub fn declare_backoff_strategy_for(
        &mut self,
        strategy: BackoffStrategy,
        retries: u32,
    ) -> Result<(), ConfigError> {
        if retries == 0 {
            return Err(ConfigError::invalid("retries", "must be positive integer"));
        }
        let padded = (retries as usize).max(DEFAULT_TABLE_LEN);
        let table = match strategy.intervals(padded) {
            Ok(table) => table,
            Err(ConfigError::BackoffTableTooShort { .. }) if padded > retries as usize => {
                strategy.intervals(retries as usize)?
            }
            Err(e) => return Err(e),
        };
        self.backoff_intervals = table;
        self.backoff = Some(strategy);
        self.retries = retries;
        Ok(())
    }

    /// True when the failure's kind is, or descends from, a retriable kind.
    pub fn classify(&self, failure: &dyn Failure) -> bool {
        let kind = failure.kind();
        self.retriable.iter().any(|r| kind.is_a(*r))
    }

    /// Decide what to do with a failed attempt.
    ///
    /// `attempts_remaining` is the budget before this retry is spent. The
    /// retry condition is only consulted once a retry is otherwise allowed.
    pub fn decide(&self, failure: &dyn Failure, attempts_remaining: u32) -> RetryDecision {
        if !self.classify(failure) {
            return RetryDecision::Stop(StopReason::NonRetriable);
        }
        if attempts_remaining == 0 {
            return RetryDecision::Stop(StopReason::Exhausted);
        }
        if (self.retry_condition)(failure) {
            return RetryDecision::Stop(StopReason::Suppressed);
        }
        RetryDecision::RetryAfter(self.next_interval(attempts_remaining))
    }

    /// Wait before the retry that will leave `attempts_remaining - 1` retries.
    /// Indexed by the number of retries already consumed.
    pub fn next_interval(&self, attempts_remaining: u32) -> Duration {
        let consumed = self.retries.saturating_sub(attempts_remaining) as usize;
        self.backoff_intervals
            .get(consumed)
            .copied()
            .unwrap_or_default()
    }

    /// Check the table invariant. Setters keep it; this guards values
    /// handed back from `global::configure` callbacks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retries == 0 {
            return Err(ConfigError::invalid("retries", "must be positive integer"));
        }
        merge::check_table_len(self.backoff_intervals.len(), self.retries)
    }
}

#[cfg(test)]
mod tests;
