//! Per-call overrides: an ordered key/value mapping onto configuration fields.

use super::{OnRetry, RetryCondition};
use crate::error::ConfigError;
use crate::retry::{Failure, FailureKind};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Configuration field names accepted in overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Retries,
    Retriable,
    RetryCondition,
    OnRetry,
    BackoffIntervals,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::Retries,
        ConfigKey::Retriable,
        ConfigKey::RetryCondition,
        ConfigKey::OnRetry,
        ConfigKey::BackoffIntervals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Retries => "retries",
            ConfigKey::Retriable => "retriable",
            ConfigKey::RetryCondition => "retry_condition",
            ConfigKey::OnRetry => "on_retry",
            ConfigKey::BackoffIntervals => "backoff_intervals",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownConfigurationKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One override entry. Values are unvalidated until merged.
#[derive(Clone)]
pub enum Override {
    /// Signed so that out-of-range input reaches validation instead of the type system.
    Retries(i64),
    Retriable(Vec<FailureKind>),
    RetryCondition(RetryCondition),
    OnRetry(OnRetry),
    BackoffIntervals(Vec<Duration>),
}

impl Override {
    pub fn key(&self) -> ConfigKey {
        match self {
            Override::Retries(_) => ConfigKey::Retries,
            Override::Retriable(_) => ConfigKey::Retriable,
            Override::RetryCondition(_) => ConfigKey::RetryCondition,
            Override::OnRetry(_) => ConfigKey::OnRetry,
            Override::BackoffIntervals(_) => ConfigKey::BackoffIntervals,
        }
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Retries(n) => write!(f, "Retries({})", n),
            Override::Retriable(kinds) => write!(f, "Retriable({:?})", kinds),
            Override::RetryCondition(_) => f.write_str("RetryCondition(..)"),
            Override::OnRetry(_) => f.write_str("OnRetry(..)"),
            Override::BackoffIntervals(t) => write!(f, "BackoffIntervals({:?})", t),
        }
    }
}

/// Overrides for a single invocation. Setting a key twice keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    entries: Vec<Override>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Override> {
        self.entries.iter()
    }

    pub fn set(&mut self, entry: Override) {
        let key = entry.key();
        match self.entries.iter_mut().find(|o| o.key() == key) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn retries(mut self, retries: i64) -> Self {
        self.set(Override::Retries(retries));
        self
    }

    pub fn retriable(mut self, kinds: Vec<FailureKind>) -> Self {
        self.set(Override::Retriable(kinds));
        self
    }

    pub fn retry_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&dyn Failure) -> bool + Send + Sync + 'static,
    {
        self.set(Override::RetryCondition(Arc::new(condition)));
        self
    }

    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Failure, u32) + Send + Sync + 'static,
    {
        self.set(Override::OnRetry(Arc::new(hook)));
        self
    }

    pub fn backoff_intervals(mut self, intervals: Vec<Duration>) -> Self {
        self.set(Override::BackoffIntervals(intervals));
        self
    }

    /// Insert an entry from a dynamic source (config file, `key=value` flag).
    ///
    /// Integers and floats in `backoff_intervals` are seconds. Hooks cannot
    /// be expressed as data, so hook keys are rejected here.
    pub fn insert(&mut self, name: &str, value: &toml::Value) -> Result<(), ConfigError> {
        let key: ConfigKey = name.parse()?;
        let entry = match key {
            ConfigKey::Retries => match value {
                toml::Value::Integer(n) => Override::Retries(*n),
                _ => return Err(ConfigError::invalid("retries", "must be positive integer")),
            },
            ConfigKey::Retriable => {
                let names = value
                    .as_array()
                    .ok_or_else(|| {
                        ConfigError::invalid("retriable", "must be array of retriable errors")
                    })?
                    .iter()
                    .map(|v| {
                        v.as_str().map(str::to_string).ok_or_else(|| {
                            ConfigError::invalid("retriable", "must be array of retriable errors")
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Override::Retriable(resolve_kinds(&names)?)
            }
            ConfigKey::RetryCondition => {
                return Err(ConfigError::invalid("retry_condition", "must be callable"))
            }
            ConfigKey::OnRetry => return Err(ConfigError::invalid("on_retry", "must be callable")),
            ConfigKey::BackoffIntervals => {
                let items = value.as_array().ok_or_else(|| {
                    ConfigError::invalid("backoff_intervals", "must be array of durations")
                })?;
                Override::BackoffIntervals(
                    items
                        .iter()
                        .map(seconds_value)
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
        };
        self.set(entry);
        Ok(())
    }

    /// Build overrides from a TOML table. Every key is checked before any
    /// value is converted, so an unknown key is always reported as such.
    pub fn from_table(table: &toml::Table) -> Result<Self, ConfigError> {
        for name in table.keys() {
            name.parse::<ConfigKey>()?;
        }
        let mut out = Self::new();
        for (name, value) in table {
            out.insert(name, value)?;
        }
        Ok(out)
    }
}

/// Resolve built-in kind names.
pub(crate) fn resolve_kinds(names: &[String]) -> Result<Vec<FailureKind>, ConfigError> {
    names
        .iter()
        .map(|name| {
            FailureKind::builtin(name).ok_or_else(|| {
                ConfigError::invalid("retriable", format!("has unknown failure kind `{}`", name))
            })
        })
        .collect()
}

fn seconds_value(value: &toml::Value) -> Result<Duration, ConfigError> {
    let secs = match value {
        toml::Value::Integer(n) => *n as f64,
        toml::Value::Float(f) => *f,
        _ => return Err(ConfigError::invalid("backoff_intervals", "must be array of durations")),
    };
    Duration::try_from_secs_f64(secs).map_err(|_| {
        ConfigError::invalid("backoff_intervals", "must contain non-negative durations")
    })
}
