//! Error types for reconciliation runs

use std::fmt;
use std::path::PathBuf;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Run step that can fail a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Extract,
    Fetch,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Extract => f.write_str("extract"),
            Step::Fetch => f.write_str("fetch"),
        }
    }
}

/// Errors that end a reconciliation run
///
/// Per-row and per-key failures are not errors: they are collected in the
/// extraction warnings and batch reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The export could not be opened or its header read
    #[error("cannot read export {}: {message}", path.display())]
    Extract { path: PathBuf, message: String },

    /// Listing the remote schema failed
    #[error("cannot fetch attribute definitions: {0}")]
    Fetch(#[source] wapi::Error),

    /// An operation was called out of order
    #[error("invalid run state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// Invalid search pattern
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A confirmation callback failed
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn extract(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Extract {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// The run step that failed, for extract and fetch failures
    pub fn step(&self) -> Option<Step> {
        match self {
            Error::Extract { .. } => Some(Step::Extract),
            Error::Fetch(_) => Some(Step::Fetch),
            _ => None,
        }
    }

    /// The underlying appliance error, if any
    pub fn remote(&self) -> Option<&wapi::Error> {
        match self {
            Error::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step() {
        let err = Error::extract("/tmp/vpcs.csv", "no such file");
        assert_eq!(err.step(), Some(Step::Extract));
        assert_eq!(err.to_string(), "cannot read export /tmp/vpcs.csv: no such file");

        let err = Error::Fetch(wapi::Error::rejected(401, "Authorization Required"));
        assert_eq!(err.step(), Some(Step::Fetch));
        assert_eq!(err.remote().and_then(wapi::Error::status), Some(401));

        let err = Error::InvalidState {
            expected: "Diffed",
            actual: "Init".to_string(),
        };
        assert_eq!(err.step(), None);
    }
}
