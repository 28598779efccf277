//! Failure kinds and the parent/child table they form.

use std::fmt;
use std::io;

/// A failure kind tag with an optional parent.
///
/// Kinds form an explicit hierarchy: each kind points at its parent, and a
/// kind "is a" another kind when it equals it or one of its ancestors does.
/// Callers declare their own kinds as `const` children of any built-in:
///
/// ```
/// use retrier_core::retry::{kinds, FailureKind};
///
/// const DECLINED: FailureKind = FailureKind::child("payments.declined", &kinds::HTTP);
/// assert!(DECLINED.is_a(kinds::FAILURE));
/// ```
#[derive(Clone, Copy)]
pub struct FailureKind {
    name: &'static str,
    parent: Option<&'static FailureKind>,
}

impl FailureKind {
    /// A kind with no parent.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// A kind descending from `parent`.
    pub const fn child(name: &'static str, parent: &'static FailureKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<FailureKind> {
        self.parent.copied()
    }

    /// True if `self` equals `ancestor` or descends from it.
    pub fn is_a(&self, ancestor: FailureKind) -> bool {
        let mut current = Some(*self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Resolve a built-in kind by its dotted name.
    pub fn builtin(name: &str) -> Option<FailureKind> {
        kinds::ALL.iter().copied().find(|k| k.name == name)
    }
}

impl PartialEq for FailureKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FailureKind {}

impl fmt::Debug for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FailureKind({})", self.name)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Built-in kinds covering transport, HTTP and child-process failures.
pub mod kinds {
    use super::FailureKind;

    /// Root of every kind.
    pub const FAILURE: FailureKind = FailureKind::root("failure");

    pub const IO: FailureKind = FailureKind::child("io", &FAILURE);
    pub const CONNECTION_RESET: FailureKind = FailureKind::child("io.connection_reset", &IO);
    pub const CONNECTION_REFUSED: FailureKind = FailureKind::child("io.connection_refused", &IO);
    pub const TIMEOUT: FailureKind = FailureKind::child("io.timeout", &IO);

    pub const HTTP: FailureKind = FailureKind::child("http", &FAILURE);
    /// Server asked us to come back later (429, 503).
    pub const HTTP_RETRIABLE: FailureKind = FailureKind::child("http.retriable", &HTTP);
    pub const HTTP_SERVER_ERROR: FailureKind = FailureKind::child("http.server_error", &HTTP);
    pub const HTTP_CLIENT_ERROR: FailureKind = FailureKind::child("http.client_error", &HTTP);

    pub const PROCESS: FailureKind = FailureKind::child("process", &FAILURE);
    /// A child process exited with a non-zero status.
    pub const PROCESS_EXIT: FailureKind = FailureKind::child("process.exit", &PROCESS);

    pub(crate) const ALL: &[FailureKind] = &[
        FAILURE,
        IO,
        CONNECTION_RESET,
        CONNECTION_REFUSED,
        TIMEOUT,
        HTTP,
        HTTP_RETRIABLE,
        HTTP_SERVER_ERROR,
        HTTP_CLIENT_ERROR,
        PROCESS,
        PROCESS_EXIT,
    ];
}

/// A failure the retry engine can classify.
///
/// `status` carries a response status when the failure came from a
/// request/response exchange, so suppression predicates can inspect it.
pub trait Failure: fmt::Debug + fmt::Display {
    fn kind(&self) -> FailureKind;

    fn status(&self) -> Option<u16> {
        None
    }
}

impl Failure for io::Error {
    fn kind(&self) -> FailureKind {
        super::classify::classify_io_error(self)
    }
}
