use std::collections::BTreeMap;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Uri};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Base URI of the Pwned Passwords range API.
pub const DEFAULT_BASE_URI: &str = "https://api.pwnedpasswords.com";

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("hibp-range/", env!("CARGO_PKG_VERSION"));

/// Media type and API version requested from the service.
pub const DEFAULT_ACCEPT: &str = "application/vnd.haveibeenpwned.v2+json";

/// Client configuration.
///
/// Overrides are applied as a JSON mapping merged recursively over the
/// defaults, so `{"headers": {"User-Agent": "my-app"}}` replaces the user
/// agent and keeps the default `Accept` header. Header names are matched
/// case-insensitively and stored lowercase. Keys this crate does not know
/// are kept: extra entries under `headers` are sent with every request, and
/// extra top-level keys land in [`ClientConfig::extra`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Scheme and authority that request paths are appended to.
    pub base_uri: String,
    /// Request timeout in seconds. `0` disables the timeout.
    pub timeout: u64,
    /// Headers sent with every request, keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Unrecognized top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::from([
                ("accept".to_string(), DEFAULT_ACCEPT.to_string()),
                ("user-agent".to_string(), DEFAULT_USER_AGENT.to_string()),
            ]),
            extra: Map::new(),
        }
    }
}

impl ClientConfig {
    /// Returns a copy of this configuration with `overrides` merged over it.
    pub fn merged(&self, mut overrides: Value) -> Result<Self, ConfigError> {
        let mut base = serde_json::to_value(self)?;
        lowercase_header_names(&mut base);
        lowercase_header_names(&mut overrides);
        merge_values(&mut base, overrides);
        Ok(serde_json::from_value(base)?)
    }

    /// Parses a JSON object of overrides and merges it over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::default().merged(serde_json::from_str(json)?)
    }

    /// The timeout handed to the transport, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// Converts the configured headers into a validated header map.
    pub fn header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes());
            let header_name = header_name.map_err(|source| ConfigError::HeaderName {
                name: name.clone(),
                source,
            })?;
            let header_value = HeaderValue::from_str(value);
            let header_value = header_value.map_err(|source| ConfigError::HeaderValue {
                name: name.clone(),
                source,
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    /// Checks that the base URI is absolute (has a scheme and a host).
    pub fn validate_base_uri(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::BaseUri {
            uri: self.base_uri.clone(),
            reason,
        };

        let uri: Uri = self
            .base_uri
            .parse()
            .map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(invalid("missing scheme or host".to_string()));
        }
        Ok(())
    }
}

/// Lowercases the keys of the `headers` object in a serialized config.
fn lowercase_header_names(config: &mut Value) {
    if let Some(Value::Object(headers)) = config.get_mut("headers") {
        for (name, value) in std::mem::take(headers) {
            headers.insert(name.to_ascii_lowercase(), value);
        }
    }
}

/// Merges `overlay` into `base`. Objects merge key by key; any other value
/// in `overlay` replaces the one in `base`.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
