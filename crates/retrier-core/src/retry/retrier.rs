//! Type-level retry configuration and the invocation surface.

use super::kind::{Failure, FailureKind};
use super::run::{run_with_retry, run_with_retry_async};
use super::sleep::{Sleeper, ThreadSleeper};
use crate::backoff::BackoffStrategy;
use crate::configuration::{global, Configuration, Overrides};
use crate::error::ConfigError;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

/// Retry behaviour declared for one host type.
///
/// Created from a snapshot of the process-wide default and then customised
/// with the declaration setters. Hosts typically keep one in a `static`
/// (`OnceLock`/`LazyLock`) or as a field and wrap each network call:
///
/// ```no_run
/// use retrier_core::retry::{kinds, Retrier, TransportError};
///
/// let mut retrier = Retrier::new();
/// retrier
///     .number_of_retries(3)?
///     .retriable_errors(vec![kinds::HTTP_RETRIABLE, kinds::IO])
///     .retriable_condition(|e| e.status().is_some_and(|s| s < 500));
///
/// let body: Result<String, TransportError> = retrier.with_retry(|| {
///     // issue the request
///     Err(TransportError::Http(503))
/// });
/// # Ok::<(), retrier_core::ConfigError>(())
/// ```
#[derive(Clone)]
pub struct Retrier {
    config: Configuration,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Retrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Retrier {
    /// Seeded from the process-wide default as it is right now.
    pub fn new() -> Self {
        Self::from_configuration(global::config())
    }

    pub fn from_configuration(config: Configuration) -> Self {
        Self {
            config,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replace the suspension primitive used between attempts.
    pub fn with_sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Current type-level configuration.
    pub fn retriable_configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn number_of_retries(&mut self, retries: u32) -> Result<&mut Self, ConfigError> {
        self.config.set_retries(retries)?;
        Ok(self)
    }

    pub fn retriable_errors(&mut self, kinds: Vec<FailureKind>) -> &mut Self {
        self.config.set_retriable(kinds);
        self
    }

    pub fn retriable_condition<F>(&mut self, condition: F) -> &mut Self
    where
        F: Fn(&dyn Failure) -> bool + Send + Sync + 'static,
    {
        self.config.set_retry_condition(condition);
        self
    }

    pub fn on_retry<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&dyn Failure, u32) + Send + Sync + 'static,
    {
        self.config.set_on_retry(hook);
        self
    }

    pub fn backoff_strategy(&mut self, strategy: BackoffStrategy) -> Result<&mut Self, ConfigError> {
        self.config.declare_backoff_strategy(strategy)?;
        Ok(self)
    }

    /// Prepare a single invocation with per-call overrides.
    ///
    /// Empty overrides borrow the type-level configuration without
    /// validation; otherwise the merged copy lives only as long as the
    /// returned `Call`.
    pub fn with_overrides(&self, overrides: &Overrides) -> Result<Call<'_>, ConfigError> {
        let config = if overrides.is_empty() {
            Cow::Borrowed(&self.config)
        } else {
            Cow::Owned(self.config.merge(overrides)?)
        };
        Ok(Call {
            config,
            sleeper: self.sleeper.as_ref(),
        })
    }

    /// Run `op` under the type-level configuration.
    pub fn with_retry<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Failure,
    {
        run_with_retry(&self.config, self.sleeper.as_ref(), op)
    }

    /// Async form of [`Retrier::with_retry`]; waits on the tokio timer.
    pub async fn with_retry_async<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Failure,
    {
        run_with_retry_async(&self.config, op).await
    }
}

/// One invocation's effective configuration.
pub struct Call<'a> {
    config: Cow<'a, Configuration>,
    sleeper: &'a dyn Sleeper,
}

impl std::fmt::Debug for Call<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Call<'_> {
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn with_retry<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Failure,
    {
        run_with_retry(&self.config, self.sleeper, op)
    }

    pub async fn with_retry_async<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Failure,
    {
        run_with_retry_async(&self.config, op).await
    }
}
