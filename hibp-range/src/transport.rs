//! HTTP transport abstraction.
//!
//! [`BreachChecker`](crate::BreachChecker) only needs to issue a single GET for
//! a path and read back a status and a body. Anything that can do that, and
//! report a failure to reach the service separately from an HTTP error status,
//! can back a checker.

use bytes::Bytes;
use http::{HeaderMap, Response};

/// Boxed error type carried by [`TransportError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The service could not be reached, so no response exists.
///
/// The underlying failure is available through
/// [`source`](std::error::Error::source) and is not repeated in the message.
#[derive(Debug, thiserror::Error)]
#[error("transport failure")]
pub struct TransportError {
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Performs GET requests against a fixed base endpoint.
pub trait Transport {
    /// Issues one GET for `path` (e.g. `/range/5BAA6`) with the given headers.
    ///
    /// Returns `Ok` for any response the service sent, whatever its status.
    /// `Err` is reserved for failures before a response was received.
    fn get(&self, path: &str, headers: &HeaderMap) -> Result<Response<Bytes>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, path: &str, headers: &HeaderMap) -> Result<Response<Bytes>, TransportError> {
        (**self).get(path, headers)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, path: &str, headers: &HeaderMap) -> Result<Response<Bytes>, TransportError> {
        (**self).get(path, headers)
    }
}

#[cfg(feature = "reqwest")]
pub use self::blocking::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod blocking {
    use bytes::Bytes;
    use http::{HeaderMap, Response};

    use super::{Transport, TransportError};
    use crate::config::ClientConfig;
    use crate::error::ConfigError;

    /// Blocking transport backed by `reqwest`.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::blocking::Client,
        base_uri: String,
    }

    impl ReqwestTransport {
        /// Builds a transport for the configured base URI and timeout.
        pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
            config.validate_base_uri()?;
            let client = reqwest::blocking::Client::builder()
                .timeout(config.timeout())
                .build()
                .map_err(ConfigError::HttpClient)?;

            Ok(Self::with_client(client, &config.base_uri))
        }

        /// Wraps an existing client. Request paths are appended to `base_uri`.
        pub fn with_client(client: reqwest::blocking::Client, base_uri: &str) -> Self {
            Self {
                client,
                base_uri: base_uri.trim_end_matches('/').to_string(),
            }
        }

        pub fn base_uri(&self) -> &str {
            &self.base_uri
        }
    }

    impl Transport for ReqwestTransport {
        fn get(&self, path: &str, headers: &HeaderMap) -> Result<Response<Bytes>, TransportError> {
            let url = format!("{}{}", self.base_uri, path);
            let response = self
                .client
                .get(&url)
                .headers(headers.clone())
                .send()
                .map_err(TransportError::new)?;

            let status = response.status();
            let response_headers = response.headers().clone();
            // A body that fails mid-read never reached us either.
            let body = response.bytes().map_err(TransportError::new)?;

            let mut out = Response::new(body);
            *out.status_mut() = status;
            *out.headers_mut() = response_headers;
            Ok(out)
        }
    }
}
