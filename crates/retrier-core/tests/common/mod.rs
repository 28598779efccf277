//! Shared helpers for retry engine integration tests.

#![allow(dead_code)]

use retrier_core::retry::{kinds, Failure, FailureKind, Sleeper};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every requested wait instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

/// Failure whose kind is chosen by the test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeFailure {
    pub kind: FailureKind,
    pub message: String,
    pub status: Option<u16>,
}

impl FakeFailure {
    pub fn new(kind: FailureKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
            status: None,
        }
    }

    pub fn retriable(message: &str) -> Self {
        Self::new(kinds::HTTP_RETRIABLE, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for FakeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Failure for FakeFailure {
    fn kind(&self) -> FailureKind {
        self.kind
    }

    fn status(&self) -> Option<u16> {
        self.status
    }
}

pub fn secs(v: &[u64]) -> Vec<Duration> {
    v.iter().copied().map(Duration::from_secs).collect()
}
