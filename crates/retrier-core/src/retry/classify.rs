//! Map HTTP statuses and I/O errors onto failure kinds.

use super::kind::{kinds, FailureKind};
use std::io;

/// Classify an HTTP status code.
///
/// 429 and 503 mean the server asked us to come back later; any other 5xx
/// is a server error and 4xx a client error. Anything else is only `http`.
pub fn classify_http_status(code: u16) -> FailureKind {
    match code {
        429 | 503 => kinds::HTTP_RETRIABLE,
        500..=599 => kinds::HTTP_SERVER_ERROR,
        400..=499 => kinds::HTTP_CLIENT_ERROR,
        _ => kinds::HTTP,
    }
}

/// Classify an I/O error by its `ErrorKind`.
pub fn classify_io_error(e: &io::Error) -> FailureKind {
    match e.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => kinds::CONNECTION_RESET,
        io::ErrorKind::ConnectionRefused => kinds::CONNECTION_REFUSED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => kinds::TIMEOUT,
        _ => kinds::IO,
    }
}
