//! Error types for appliance operations.
//!
//! Errors are categorized so callers can decide whether a failed call is worth
//! retrying. The client itself never retries.

use std::fmt;

/// Result type alias for appliance operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of appliance errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Host unreachable, TLS failure, timeout.
    Transport,
    /// Credentials rejected (401/403).
    Auth,
    /// Referenced object does not exist (404), usually a stale reference.
    NotFound,
    /// Any other non-2xx answer from the appliance.
    Rejected,
    /// Response body was not what the API documents.
    Format,
    /// Endpoint settings are unusable.
    Config,
}

impl ErrorCategory {
    /// Whether this error category is typically transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Could not reach the appliance",
            Self::Auth => "Authentication failed",
            Self::NotFound => "Object not found",
            Self::Rejected => "Request rejected by the appliance",
            Self::Format => "Unexpected response format",
            Self::Config => "Invalid endpoint configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check the grid master address, network access and TLS settings",
            Self::Auth => "Verify the admin name and password",
            Self::NotFound => "The object may have been changed or removed by someone else",
            Self::Rejected => "Inspect the response body for the appliance's reason",
            Self::Format => "Check that the WAPI version matches the appliance",
            Self::Config => "Fix the endpoint settings and try again",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the appliance.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced an HTTP answer.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The appliance answered with a non-2xx status.
    #[error("appliance returned HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, kept verbatim for diagnostics.
        body: String,
    },

    /// The body could not be decoded.
    #[error("invalid appliance response: {0}")]
    InvalidResponse(String),

    /// Endpoint settings are unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl Error {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a rejection error.
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Rejected { status, .. } => match status {
                401 | 403 => ErrorCategory::Auth,
                404 => ErrorCategory::NotFound,
                _ => ErrorCategory::Rejected,
            },
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::InvalidEndpoint(_) => ErrorCategory::Config,
        }
    }

    /// Whether this error is typically transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// HTTP status, when the appliance answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body, when the appliance answered.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Rejected {
                status: code,
                body: String::new(),
            },
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::Transport {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Transport.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Rejected.is_retryable());
        assert!(!ErrorCategory::Format.is_retryable());
        assert!(!ErrorCategory::Config.is_retryable());
    }

    #[test]
    fn test_error_category_text() {
        for category in [
            ErrorCategory::Transport,
            ErrorCategory::Auth,
            ErrorCategory::NotFound,
            ErrorCategory::Rejected,
            ErrorCategory::Format,
            ErrorCategory::Config,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
        assert!(format!("{}", ErrorCategory::Auth).contains("Authentication"));
    }

    #[test]
    fn test_rejected_categories() {
        assert_eq!(Error::rejected(401, "").category(), ErrorCategory::Auth);
        assert_eq!(Error::rejected(403, "").category(), ErrorCategory::Auth);
        assert_eq!(Error::rejected(404, "").category(), ErrorCategory::NotFound);
        assert_eq!(Error::rejected(400, "").category(), ErrorCategory::Rejected);
        assert_eq!(Error::rejected(500, "").category(), ErrorCategory::Rejected);
    }

    #[test]
    fn test_transport_is_retryable() {
        let err = Error::transport("connection refused");
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert!(err.is_retryable());
        assert_eq!(err.status(), None);
        assert_eq!(err.body(), None);
    }

    #[test]
    fn test_rejected_keeps_status_and_body() {
        let err = Error::rejected(400, "AdmConDataError: None (IBDataConflictError)");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.body(), Some("AdmConDataError: None (IBDataConflictError)"));
        let display = err.to_string();
        assert!(display.contains("400"));
        assert!(display.contains("IBDataConflictError"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_from_ureq_status_code() {
        let err: Error = ureq::Error::StatusCode(502).into();
        assert_eq!(err.status(), Some(502));
    }
}
