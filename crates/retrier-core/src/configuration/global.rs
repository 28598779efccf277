//! Process-wide default configuration.
//!
//! Created lazily on first access. A `Retrier` copies it once when it is
//! created, so later changes here only affect retriers created afterwards.

use super::{Configuration, Overrides};
use crate::error::ConfigError;
use std::sync::{OnceLock, PoisonError, RwLock};

static DEFAULT: OnceLock<RwLock<Configuration>> = OnceLock::new();

fn cell() -> &'static RwLock<Configuration> {
    DEFAULT.get_or_init(|| RwLock::new(Configuration::default()))
}

/// Snapshot of the current process-wide default.
pub fn config() -> Configuration {
    cell()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the default with the built-in baseline plus `overrides`.
pub fn reset(overrides: &Overrides) -> Result<(), ConfigError> {
    let fresh = Configuration::new(overrides)?;
    install(fresh);
    tracing::debug!("process-wide retry configuration reset");
    Ok(())
}

/// Adjust the default in place.
///
/// `f` works on a copy; the copy is installed only if `f` succeeds and the
/// result still validates.
pub fn configure<F>(f: F) -> Result<(), ConfigError>
where
    F: FnOnce(&mut Configuration) -> Result<(), ConfigError>,
{
    let mut scratch = config();
    f(&mut scratch)?;
    scratch.validate()?;
    install(scratch);
    Ok(())
}

fn install(cfg: Configuration) {
    *cell().write().unwrap_or_else(PoisonError::into_inner) = cfg;
}
