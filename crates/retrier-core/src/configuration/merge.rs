//! Validating merge of overrides onto a configuration.

use super::{Configuration, Override, Overrides};
use crate::error::ConfigError;

pub(super) fn table_too_short() -> ConfigError {
    ConfigError::invalid(
        "backoff_intervals",
        "size must be greater or equal to number of retries",
    )
}

pub(super) fn check_table_len(len: usize, retries: u32) -> Result<(), ConfigError> {
    if len < retries as usize {
        return Err(table_too_short());
    }
    Ok(())
}

fn check_retries(n: i64) -> Result<u32, ConfigError> {
    u32::try_from(n)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::invalid("retries", "must be positive integer"))
}

impl Configuration {
    /// Apply `overrides` to a copy of `self`.
    ///
    /// All entries are validated against the resulting retry budget before
    /// the copy is returned; on error nothing is produced and `self` is
    /// untouched either way. The backoff table is never regenerated here: a
    /// budget beyond the current table needs a `backoff_intervals` entry too.
    pub fn merge(&self, overrides: &Overrides) -> Result<Configuration, ConfigError> {
        let mut next = self.clone();
        let mut retries = None;
        let mut table = None;

        for entry in overrides.iter() {
            match entry {
                Override::Retries(n) => retries = Some(check_retries(*n)?),
                Override::Retriable(kinds) => next.retriable = kinds.clone(),
                Override::RetryCondition(f) => next.retry_condition = f.clone(),
                Override::OnRetry(f) => next.on_retry = f.clone(),
                Override::BackoffIntervals(t) => table = Some(t.clone()),
            }
        }

        let retries = retries.unwrap_or(self.retries);
        match table {
            Some(t) => {
                check_table_len(t.len(), retries)?;
                next.backoff_intervals = t;
                next.backoff = None;
            }
            None => check_table_len(next.backoff_intervals.len(), retries)?,
        }
        next.retries = retries;

        tracing::trace!(?overrides, "merged retry overrides");
        Ok(next)
    }
}
