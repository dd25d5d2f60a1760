//! Password digests and the range prefix derived from them.
//!
//! The range prefix is the only part of a digest that leaves the process.

use std::fmt;

use sha1::{Digest as _, Sha1};

use crate::error::Error;

/// Length of an uppercase hex SHA-1 digest.
pub const DIGEST_LEN: usize = 40;

/// Length of the range prefix sent to the service (5 hex chars).
pub const PREFIX_LEN: usize = 5;

/// Length of the suffix matched locally against the response.
pub const SUFFIX_LEN: usize = DIGEST_LEN - PREFIX_LEN;

/// Hex lookup table for digest encoding.
pub const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// A password as given by the caller.
#[derive(Clone, Copy)]
pub enum PasswordInput<'a> {
    /// Raw password bytes, hashed locally.
    Plaintext(&'a [u8]),
    /// A SHA-1 digest the caller already computed, in hex of either case.
    Sha1Hex(&'a [u8]),
}

impl<'a> PasswordInput<'a> {
    pub fn new(input: &'a [u8], already_hashed: bool) -> Self {
        if already_hashed {
            Self::Sha1Hex(input)
        } else {
            Self::Plaintext(input)
        }
    }

    pub fn digest(&self) -> Result<Digest, Error> {
        match *self {
            Self::Plaintext(password) => Ok(Digest::from_password(password)),
            Self::Sha1Hex(hex) => Digest::from_hex(hex),
        }
    }
}

// Never print the password itself.
impl fmt::Debug for PasswordInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext(_) => f.write_str("Plaintext(..)"),
            Self::Sha1Hex(_) => f.write_str("Sha1Hex(..)"),
        }
    }
}

/// Uppercase hexadecimal SHA-1 digest of a password.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Hashes raw password bytes.
    pub fn from_password(password: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(password);
        let hash: [u8; 20] = hasher.finalize().into();

        let mut hex = [0u8; DIGEST_LEN];
        for (i, byte) in hash.iter().enumerate() {
            hex[i * 2] = HEX_CHARS[(byte >> 4) as usize];
            hex[i * 2 + 1] = HEX_CHARS[(byte & 0x0f) as usize];
        }
        Self(hex)
    }

    /// Accepts an existing hex digest, normalizing it to uppercase.
    pub fn from_hex(hex: &[u8]) -> Result<Self, Error> {
        if hex.len() != DIGEST_LEN {
            return Err(Error::InvalidInput(format!(
                "expected a {DIGEST_LEN}-character SHA-1 hex digest, got {} characters",
                hex.len()
            )));
        }

        let mut out = [0u8; DIGEST_LEN];
        for (slot, &c) in out.iter_mut().zip(hex) {
            if !c.is_ascii_hexdigit() {
                return Err(Error::InvalidInput(
                    "SHA-1 digest contains non-hexadecimal characters".to_string(),
                ));
            }
            *slot = c.to_ascii_uppercase();
        }
        Ok(Self(out))
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: every byte is taken from HEX_CHARS or checked to be ASCII hex.
        unsafe { std::str::from_utf8_unchecked(&self.0) }
    }

    pub fn prefix(&self) -> RangePrefix {
        let mut prefix = [0u8; PREFIX_LEN];
        prefix.copy_from_slice(&self.0[..PREFIX_LEN]);
        RangePrefix(prefix)
    }

    /// The 35 characters after the range prefix.
    pub fn suffix(&self) -> &str {
        &self.as_str()[PREFIX_LEN..]
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}..)", self.prefix())
    }
}

/// First 5 characters of a [`Digest`], as sent in `/range/{prefix}`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangePrefix([u8; PREFIX_LEN]);

impl RangePrefix {
    pub fn as_str(&self) -> &str {
        // SAFETY: copied from a Digest, which is ASCII hex.
        unsafe { std::str::from_utf8_unchecked(&self.0) }
    }
}

impl fmt::Display for RangePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for RangePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RangePrefix({})", self.as_str())
    }
}

/// Computes the digest for `input`, hashing it unless `already_hashed` is set.
pub fn derive(input: &[u8], already_hashed: bool) -> Result<Digest, Error> {
    PasswordInput::new(input, already_hashed).digest()
}

/// The range prefix for `digest`.
#[inline]
pub fn range_prefix(digest: &Digest) -> RangePrefix {
    digest.prefix()
}
