//! User-facing error taxonomy shared by every note operation.

use std::fmt::{Display, Formatter};

/// Distinguishable failure class surfaced to callers and the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Blank title or content; caught before any I/O.
    Validation,
    /// Selected image could not be read from local storage.
    ReadFailure,
    /// Transport-level failure talking to the image host.
    NetworkFailure,
    /// Image host answered without the expected `data.link`.
    MalformedResponse,
    /// Document store rejected or could not complete the write.
    Store,
}

impl ErrorCategory {
    /// Stable machine-readable label (`validation`, `read_failure`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ReadFailure => "read_failure",
            Self::NetworkFailure => "network_failure",
            Self::MalformedResponse => "malformed_response",
            Self::Store => "store",
        }
    }
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
