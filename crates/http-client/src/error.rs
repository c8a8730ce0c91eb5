//! Fetch failures and their retry classification.

use std::fmt;

use thiserror::Error;

/// Whether a failed fetch is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Network trouble, a timeout or a 500/502/503/504 from the origin
    Transient,
    /// Anything a retry cannot fix (4xx, cancellation, bad client setup)
    Permanent,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Transient => f.write_str("transient"),
            FetchErrorKind::Permanent => f.write_str("permanent"),
        }
    }
}

/// Errors that can occur while fetching a page from the origin
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("GET {url} timed out")]
    Timeout { url: String },

    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} failed: {reason}")]
    Connection { url: String, reason: String },

    #[error("GET {url} not sent: fetching was cancelled")]
    Cancelled { url: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// HTTP statuses the origin uses for temporary overload
const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Timeout { .. } | FetchError::Connection { .. } => FetchErrorKind::Transient,
            FetchError::Status { status, .. } if RETRYABLE_STATUSES.contains(status) => {
                FetchErrorKind::Transient
            }
            FetchError::Status { .. } | FetchError::Cancelled { .. } | FetchError::Client(_) => {
                FetchErrorKind::Permanent
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FetchErrorKind::Transient
    }

    /// URL of the failed request, when there was one
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Connection { url, .. }
            | FetchError::Cancelled { url } => Some(url),
            FetchError::Client(_) => None,
        }
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Connection {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            url: "https://example.test/".to_string(),
            status: code,
        }
    }

    #[test]
    fn test_server_errors_are_transient() {
        for code in [500, 502, 503, 504] {
            assert!(status(code).is_transient(), "HTTP {} should be retried", code);
        }
    }

    #[test]
    fn test_client_errors_are_permanent() {
        for code in [400, 401, 403, 404, 429, 501] {
            assert_eq!(status(code).kind(), FetchErrorKind::Permanent, "HTTP {}", code);
        }
    }

    #[test]
    fn test_timeout_is_transient_and_distinct_from_status() {
        let err = FetchError::Timeout {
            url: "https://example.test/".to_string(),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("timed out"));
        assert!(!matches!(err, FetchError::Status { .. }));
    }

    #[test]
    fn test_cancelled_is_permanent() {
        let err = FetchError::Cancelled {
            url: "https://example.test/".to_string(),
        };
        assert_eq!(err.kind(), FetchErrorKind::Permanent);
        assert_eq!(err.url(), Some("https://example.test/"));
    }
}
