//! Backoff interval tables.
//!
//! A strategy descriptor (kind, start, factor) expands into an ordered table
//! of waits, one per retry. The table is computed once and stored on the
//! configuration that owns it; the retry engine only indexes into it.

use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Table length used when no retry count is given.
pub const DEFAULT_TABLE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Every interval is `start`.
    Constant,
    /// `i * factor` for `i` in `start..start + retries`.
    Linear,
    /// Fibonacci numbers at or above `start`.
    Fibonacci,
    /// `start`, then jittered doubling.
    Exponential,
}

impl FromStr for BackoffKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(BackoffKind::Constant),
            "linear" => Ok(BackoffKind::Linear),
            "fibonacci" => Ok(BackoffKind::Fibonacci),
            "exponential" => Ok(BackoffKind::Exponential),
            other => Err(ConfigError::InvalidStrategyKind(other.to_string())),
        }
    }
}

impl fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackoffKind::Constant => "constant",
            BackoffKind::Linear => "linear",
            BackoffKind::Fibonacci => "fibonacci",
            BackoffKind::Exponential => "exponential",
        };
        f.write_str(s)
    }
}

/// Strategy descriptor. `start` and `factor` are in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffStrategy {
    pub kind: BackoffKind,
    #[serde(default = "default_start")]
    pub start: u64,
    #[serde(default = "default_factor")]
    pub factor: u64,
}

fn default_start() -> u64 {
    1
}

fn default_factor() -> u64 {
    1
}

impl BackoffStrategy {
    pub fn new(kind: BackoffKind, start: u64) -> Self {
        Self {
            kind,
            start,
            factor: 1,
        }
    }

    pub fn with_factor(mut self, factor: u64) -> Self {
        self.factor = factor;
        self
    }

    /// Expand into a table of exactly `retries` intervals.
    pub fn intervals(&self, retries: usize) -> Result<Vec<Duration>, ConfigError> {
        let secs = match self.kind {
            BackoffKind::Constant => vec![self.start; retries],
            BackoffKind::Linear => linear(self.start, self.factor, retries)?,
            BackoffKind::Fibonacci => fibonacci(self.start, retries)?,
            BackoffKind::Exponential => exponential(self.start, retries, &mut rand::thread_rng())?,
        };
        Ok(secs.into_iter().map(Duration::from_secs).collect())
    }
}

/// Generate a table from a strategy name, as accepted in config files and on
/// the command line.
pub fn generate(
    kind: &str,
    start: u64,
    factor: u64,
    retries: usize,
) -> Result<Vec<Duration>, ConfigError> {
    let kind: BackoffKind = kind.parse()?;
    BackoffStrategy { kind, start, factor }.intervals(retries)
}

fn too_short(requested: usize, available: usize) -> ConfigError {
    ConfigError::BackoffTableTooShort {
        requested,
        available,
    }
}

fn linear(start: u64, factor: u64, retries: usize) -> Result<Vec<u64>, ConfigError> {
    let mut out = Vec::with_capacity(retries);
    for i in 0..retries as u64 {
        let value = start
            .checked_add(i)
            .and_then(|n| n.checked_mul(factor))
            .ok_or_else(|| too_short(retries, out.len()))?;
        out.push(value);
    }
    Ok(out)
}

fn fibonacci(start: u64, retries: usize) -> Result<Vec<u64>, ConfigError> {
    let mut out = Vec::with_capacity(retries);
    if retries == 0 {
        return Ok(out);
    }
    let (mut a, mut b) = (1u64, 1u64);
    loop {
        if a >= start {
            out.push(a);
            if out.len() == retries {
                return Ok(out);
            }
        }
        match a.checked_add(b) {
            Some(next) => {
                a = b;
                b = next;
            }
            None => {
                // `b` is the last representable term.
                if b >= start {
                    out.push(b);
                }
                if out.len() == retries {
                    return Ok(out);
                }
                return Err(too_short(retries, out.len()));
            }
        }
    }
}

fn exponential<R: Rng>(start: u64, retries: usize, rng: &mut R) -> Result<Vec<u64>, ConfigError> {
    let mut out = Vec::with_capacity(retries);
    for ix in 0..retries {
        if ix == 0 {
            out.push(start);
            continue;
        }
        // Position is 1-based: entry `ix` lands in [2^(ix+1) - 1, 2^(ix+2) - 1).
        let pow = u32::try_from(ix + 1)
            .ok()
            .and_then(|shift| 1u64.checked_shl(shift))
            .filter(|p| p.checked_mul(2).is_some())
            .ok_or_else(|| too_short(retries, out.len()))?;
        out.push((pow - 1) + rng.gen_range(1..pow));
    }
    Ok(out)
}
