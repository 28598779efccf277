//! Transport failure type for callers without their own error enum.

use super::classify::{classify_http_status, classify_io_error};
use super::kind::{kinds, Failure, FailureKind};
use std::fmt;

/// Failure of a single request or command attempt.
#[derive(Debug)]
pub enum TransportError {
    /// Socket or file I/O failed (reset, refused, timeout, ...).
    Io(std::io::Error),
    /// Response had a non-2xx status.
    Http(u16),
    /// A child process exited unsuccessfully. `None` when killed by a signal.
    Exit(Option<i32>),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "{}", e),
            TransportError::Http(code) => write!(f, "HTTP {}", code),
            TransportError::Exit(Some(code)) => write!(f, "exited with status {}", code),
            TransportError::Exit(None) => write!(f, "terminated by signal"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            TransportError::Http(_) | TransportError::Exit(_) => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

impl Failure for TransportError {
    fn kind(&self) -> FailureKind {
        match self {
            TransportError::Io(e) => classify_io_error(e),
            TransportError::Http(code) => classify_http_status(*code),
            TransportError::Exit(_) => kinds::PROCESS_EXIT,
        }
    }

    fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http(code) => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_exposes_status() {
        let e = TransportError::Http(503);
        assert_eq!(e.status(), Some(503));
        assert_eq!(e.kind(), kinds::HTTP_RETRIABLE);
        assert_eq!(e.to_string(), "HTTP 503");
    }

    #[test]
    fn exit_error_is_process_exit() {
        let e = TransportError::Exit(Some(2));
        assert_eq!(e.kind(), kinds::PROCESS_EXIT);
        assert!(e.status().is_none());
        assert_eq!(e.to_string(), "exited with status 2");
    }
}
