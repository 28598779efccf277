pub mod config;
pub mod logging;

pub mod backoff;
pub mod configuration;
pub mod error;
pub mod retry;

pub use backoff::{BackoffKind, BackoffStrategy};
pub use configuration::{Configuration, Overrides};
pub use error::ConfigError;
pub use retry::{Failure, FailureKind, Retrier};
