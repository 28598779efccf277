//! Retry engine.
//!
//! This module holds failure classification (kinds and their hierarchy),
//! the retry loop, and `Retrier`, the per-type handle that owns a
//! configuration and runs operations under it.

mod classify;
mod error;
mod kind;
mod retrier;
mod run;
mod sleep;

pub use classify::{classify_http_status, classify_io_error};
pub use error::TransportError;
pub use kind::{kinds, Failure, FailureKind};
pub use retrier::{Call, Retrier};
pub use run::{run_with_retry, run_with_retry_async};
pub use sleep::{Sleeper, ThreadSleeper};
