//! Breached password checker using the Have I Been Pwned range API.
//!
//! Passwords never leave the process. Each lookup hashes the password with
//! SHA-1, sends only the first 5 hex characters of the digest to
//! `https://api.pwnedpasswords.com/range/{prefix}`, and matches the remaining
//! 35 characters against the returned candidates locally (k-anonymity).
//!
//! ```no_run
//! use hibp_range::BreachChecker;
//!
//! let mut checker = BreachChecker::default_client()?;
//! let result = checker.lookup(b"password123", false)?;
//! if result.found {
//!     println!("seen {} times", result.count);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The HTTP client is pluggable through [`Transport`]; the `reqwest` feature
//! (enabled by default) provides a blocking implementation.

pub mod checker;
pub mod config;
pub mod digest;
pub mod error;
pub mod range;
pub mod transport;

pub use checker::{BreachChecker, LookupResult, RANGE_PATH};
pub use config::ClientConfig;
pub use digest::{Digest, PasswordInput, RangePrefix, derive, range_prefix};
pub use error::{ConfigError, Error, MalformedLine};
pub use range::BreachRecord;
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{Transport, TransportError};
