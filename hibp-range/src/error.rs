use http::StatusCode;

use crate::transport::TransportError;

/// Errors returned by a breach lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input declared as a SHA-1 digest is not 40 hexadecimal characters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The transport could not reach the service. No response was received.
    #[error("Cannot connect to breach lookup service.")]
    TransportUnavailable {
        #[source]
        source: TransportError,
    },

    /// The service answered with a non-success status.
    #[error("Breach lookup service rejected range {prefix} ({status}): {message}")]
    ServiceRejected {
        prefix: String,
        status: StatusCode,
        message: String,
        /// Seconds to wait before retrying, when the service sent `Retry-After`.
        retry_after: Option<u64>,
    },

    /// The response body does not follow the `SUFFIX:COUNT` line format.
    #[error("Malformed response at line {line}: {reason}")]
    MalformedResponse { line: usize, reason: MalformedLine },
}

impl Error {
    /// Whether repeating the same lookup later could succeed.
    ///
    /// Connection failures, rate limiting and server errors are transient.
    /// Invalid input and malformed responses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::TransportUnavailable { .. } => true,
            Error::ServiceRejected { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Error::InvalidInput(_) | Error::MalformedResponse { .. } => false,
        }
    }
}

/// Why a response line could not be read as a breach record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedLine {
    #[error("missing ':' separator")]
    MissingSeparator,

    #[error("invalid count '{0}'")]
    InvalidCount(String),

    #[error("body is not valid UTF-8")]
    NotUtf8,
}

/// Errors building a client from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base URI '{uri}': {reason}")]
    BaseUri { uri: String, reason: String },

    #[error("Invalid header name '{name}'")]
    HeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },

    #[error("Invalid value for header '{name}'")]
    HeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },

    #[cfg(feature = "reqwest")]
    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}
