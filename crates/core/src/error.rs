//! Error types for dsk-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for dsk-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Quota reason codes reported by the storage service that signal the
/// current credential has run out of API budget rather than a server fault.
pub const QUOTA_REASONS: [&str; 2] = ["userRateLimitExceeded", "dailyLimitExceeded"];

/// Error types for dsk-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration or credential-loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A link that does not carry a recognizable remote id
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication or permission error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport-level network error
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP status error reported by the storage service
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Per-credential quota exhaustion, carries the machine-readable reason
    #[error("Quota exceeded: {reason}")]
    Quota { reason: String },

    /// The upload was cancelled by the caller
    #[error("Upload cancelled")]
    Cancelled,

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidLink(_) => 2, // UsageError
            Error::Network(_) | Error::Server { .. } => 3,                        // NetworkError
            Error::Auth(_) | Error::Quota { .. } => 4,                            // AuthError
            Error::NotFound(_) => 5,                                              // NotFound
            Error::Cancelled => 130,                                              // Interrupted
            _ => 1,                                                               // GeneralError
        }
    }

    /// Whether this error is a transient server fault during a chunk send.
    ///
    /// Only these HTTP statuses are worth re-sending the same byte range for;
    /// everything else either needs a credential rotation (quota) or is final.
    pub const fn is_transient_server(&self) -> bool {
        matches!(
            self,
            Error::Server {
                status: 500 | 502 | 503 | 504,
                ..
            }
        )
    }

    /// Whether this error signals per-credential quota exhaustion.
    pub const fn is_quota(&self) -> bool {
        matches!(self, Error::Quota { .. })
    }

    /// Classify a quota reason string from a structured error body.
    pub fn quota_from_reason(reason: &str) -> Option<Self> {
        if QUOTA_REASONS.contains(&reason) {
            Some(Error::Quota {
                reason: reason.to_string(),
            })
        } else {
            None
        }
    }

    /// Reduce the error to a plain message safe for downstream renderers.
    ///
    /// Angle brackets are stripped because some display layers interpret them
    /// as markup.
    pub fn normalized_message(&self) -> String {
        self.to_string().replace(['<', '>'], "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidLink("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(
            Error::Server {
                status: 503,
                message: "unavailable".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(
            Error::Quota {
                reason: "dailyLimitExceeded".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Cancelled.exit_code(), 130);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_transient_server_statuses() {
        for status in [500, 502, 503, 504] {
            let err = Error::Server {
                status,
                message: "boom".into(),
            };
            assert!(err.is_transient_server(), "status {status}");
        }

        let err = Error::Server {
            status: 404,
            message: "missing".into(),
        };
        assert!(!err.is_transient_server());
        assert!(!Error::Network("reset".into()).is_transient_server());
    }

    #[test]
    fn test_quota_from_reason() {
        assert!(Error::quota_from_reason("userRateLimitExceeded").is_some());
        assert!(Error::quota_from_reason("dailyLimitExceeded").is_some());
        assert!(Error::quota_from_reason("storageQuotaExceeded").is_none());
        assert!(Error::quota_from_reason("").is_none());
    }

    #[test]
    fn test_normalized_message_strips_markup() {
        let err = Error::General("<HttpError 403 \"rate limit\">".into());
        assert_eq!(err.normalized_message(), "HttpError 403 \"rate limit\"");
    }

    #[test]
    fn test_error_display() {
        let err = Error::Quota {
            reason: "userRateLimitExceeded".into(),
        };
        assert_eq!(err.to_string(), "Quota exceeded: userRateLimitExceeded");

        let err = Error::Server {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "Server error (HTTP 502): bad gateway");
    }
}
