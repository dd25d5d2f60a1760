use http::header::{ACCEPT, RETRY_AFTER, USER_AGENT};
use http::{HeaderMap, HeaderValue, Response};
use tracing::{debug, warn};

use crate::config::{DEFAULT_ACCEPT, DEFAULT_USER_AGENT};
use crate::digest::{Digest, RangePrefix, derive, range_prefix};
use crate::error::Error;
use crate::range;
use crate::transport::Transport;

/// Path of the range endpoint; the prefix is appended.
pub const RANGE_PATH: &str = "/range/";

/// Outcome of a single lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupResult {
    /// Whether the password's digest appears in the breach corpus.
    pub found: bool,
    /// Times the password was seen in breaches, `0` when not found.
    pub count: u64,
}

/// Checks passwords against the range API through a [`Transport`].
///
/// Only the 5-character range prefix of each digest is sent; the match against
/// the returned suffixes happens locally.
pub struct BreachChecker<T> {
    transport: T,
    headers: HeaderMap,
    last_count: u64,
}

impl<T: Transport> BreachChecker<T> {
    /// Creates a checker sending the default `User-Agent` and `Accept` headers.
    pub fn new(transport: T) -> Self {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        Self::with_headers(transport, headers)
    }

    /// Creates a checker sending exactly `headers` with every request.
    pub fn with_headers(transport: T, headers: HeaderMap) -> Self {
        Self {
            transport,
            headers,
            last_count: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Count from the most recent [`lookup`](Self::lookup), `0` after a miss
    /// or a failed lookup.
    pub fn last_count(&self) -> u64 {
        self.last_count
    }

    /// Looks up a password, hashing it first unless `already_hashed` is set.
    ///
    /// Input is validated before anything is sent. Overwrites
    /// [`last_count`](Self::last_count).
    pub fn lookup(
        &mut self,
        password: &[u8],
        already_hashed: bool,
    ) -> Result<LookupResult, Error> {
        self.last_count = 0;
        let digest = derive(password, already_hashed)?;
        let result = self.lookup_digest(&digest)?;
        self.last_count = result.count;
        Ok(result)
    }

    /// Returns whether a password has been seen in a breach.
    pub fn is_pwned(&mut self, password: &str, already_hashed: bool) -> Result<bool, Error> {
        Ok(self.lookup(password.as_bytes(), already_hashed)?.found)
    }

    /// Looks up an already derived digest without touching `last_count`.
    pub fn lookup_digest(&self, digest: &Digest) -> Result<LookupResult, Error> {
        let prefix = range_prefix(digest);
        let path = format!("{RANGE_PATH}{prefix}");

        debug!(%prefix, "requesting breach range");
        let response = self
            .transport
            .get(&path, &self.headers)
            .map_err(|source| Error::TransportUnavailable { source })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%prefix, status = status.as_u16(), "breach range request rejected");
            return Err(rejection(prefix, &response));
        }

        let body = range::decode_body(response.body())?;
        let scan = range::scan(body, digest.suffix())?;
        let result = LookupResult {
            found: scan.count.is_some(),
            count: scan.count.unwrap_or(0),
        };

        debug!(
            %prefix,
            records = scan.records,
            found = result.found,
            "breach range scanned"
        );
        Ok(result)
    }
}

/// Builds a `ServiceRejected` error from a non-success response.
///
/// The service reports errors as `{"statusCode": 429, "message": "..."}`; the
/// message is extracted when present, otherwise the body text is used.
fn rejection(prefix: RangePrefix, response: &Response<bytes::Bytes>) -> Error {
    let status = response.status();
    let text = String::from_utf8_lossy(response.body());
    let text = text.trim();

    let message = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|json| {
            json.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.to_string());
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        message
    };

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok());

    Error::ServiceRejected {
        prefix: prefix.to_string(),
        status,
        message,
        retry_after,
    }
}

#[cfg(feature = "reqwest")]
mod client {
    use super::BreachChecker;
    use crate::config::ClientConfig;
    use crate::error::ConfigError;
    use crate::transport::ReqwestTransport;

    impl BreachChecker<ReqwestTransport> {
        /// Builds a checker with a `reqwest` transport from `config`.
        pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
            let headers = config.header_map()?;
            let transport = ReqwestTransport::from_config(config)?;
            Ok(Self::with_headers(transport, headers))
        }

        /// Builds a checker for the public service with default settings.
        pub fn default_client() -> Result<Self, ConfigError> {
            Self::from_config(&ClientConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::transport::TransportError;

    /// Always answers with the same status and body, counting calls.
    struct Fixed {
        status: StatusCode,
        body: &'static str,
        calls: Cell<usize>,
    }

    impl Fixed {
        fn new(status: StatusCode, body: &'static str) -> Self {
            Self {
                status,
                body,
                calls: Cell::new(0),
            }
        }
    }

    impl Transport for Fixed {
        fn get(
            &self,
            _path: &str,
            _headers: &HeaderMap,
        ) -> Result<Response<Bytes>, TransportError> {
            self.calls.set(self.calls.get() + 1);
            let mut response = Response::new(Bytes::from_static(self.body.as_bytes()));
            *response.status_mut() = self.status;
            Ok(response)
        }
    }

    const PASSWORD_BODY: &str =
        "1E4C9B93F3F0682250B6CF8331B7EE68FD8:3303003\r\n1E4DCBAAD9A9C8A9F1B2C0D35B6A1F20F52:2";

    #[test]
    fn test_default_headers() {
        let checker = BreachChecker::new(Fixed::new(StatusCode::OK, ""));
        assert_eq!(checker.headers()[USER_AGENT], DEFAULT_USER_AGENT);
        assert_eq!(checker.headers()[ACCEPT], DEFAULT_ACCEPT);
    }

    #[test]
    fn test_last_count_tracks_most_recent_lookup() {
        let mut checker = BreachChecker::new(Fixed::new(StatusCode::OK, PASSWORD_BODY));

        assert!(checker.is_pwned("password", false).unwrap());
        assert_eq!(checker.last_count(), 3303003);

        assert!(!checker.is_pwned("not-in-this-range", false).unwrap());
        assert_eq!(checker.last_count(), 0);
    }

    #[test]
    fn test_lookup_digest_leaves_last_count() {
        let mut checker = BreachChecker::new(Fixed::new(StatusCode::OK, PASSWORD_BODY));
        checker.lookup(b"password", false).unwrap();

        let digest = derive(b"password", false).unwrap();
        let result = checker.lookup_digest(&digest).unwrap();
        assert!(result.found);
        assert_eq!(result.count, 3303003);
        assert_eq!(checker.last_count(), 3303003);
    }

    #[test]
    fn test_failed_lookup_resets_last_count() {
        let mut checker = BreachChecker::new(Fixed::new(StatusCode::OK, PASSWORD_BODY));
        checker.lookup(b"password", false).unwrap();

        assert!(checker.lookup(b"short", true).is_err());
        assert_eq!(checker.last_count(), 0);
        assert_eq!(checker.transport().calls.get(), 1);
    }

    #[test]
    fn test_rejection_uses_service_message() {
        let body = r#"{ "statusCode": 429, "message": "Rate limit is exceeded." }"#;
        let checker = BreachChecker::new(Fixed::new(StatusCode::TOO_MANY_REQUESTS, body));
        let digest = derive(b"password", false).unwrap();

        match checker.lookup_digest(&digest) {
            Err(Error::ServiceRejected {
                prefix,
                status,
                message,
                retry_after,
            }) => {
                assert_eq!(prefix, "5BAA6");
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(message, "Rate limit is exceeded.");
                assert_eq!(retry_after, None);
            }
            other => panic!("expected ServiceRejected, got {other:?}"),
        }
    }

    #[test]
    fn test_rejection_falls_back_to_reason() {
        let checker = BreachChecker::new(Fixed::new(StatusCode::BAD_REQUEST, ""));
        let digest = derive(b"password", false).unwrap();

        match checker.lookup_digest(&digest) {
            Err(Error::ServiceRejected { message, .. }) => assert_eq!(message, "Bad Request"),
            other => panic!("expected ServiceRejected, got {other:?}"),
        }
    }
}
