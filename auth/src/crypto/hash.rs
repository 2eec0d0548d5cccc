//! # Message Digests
//!
//! Every message is reduced to a 32-byte SHA-256 digest before it goes near
//! the curve. One hash, fixed forever (see [`DIGEST_ALGORITHM`]). There is
//! no runtime switch and there never will be: a signature over a BLAKE3
//! digest and a signature over a SHA-256 digest of the same bytes are
//! unrelated objects, and letting callers pick would only invite confusion
//! about which one a client actually signed.
//!
//! [`DIGEST_ALGORITHM`]: crate::config::DIGEST_ALGORITHM

use sha2::{Digest as _, Sha256};
use std::fmt;

use super::error::EncodingError;
use crate::config::DIGEST_LENGTH;

/// A 32-byte SHA-256 digest, the only thing signatures are ever computed over.
///
/// Typed so you can't hand a raw message to a function that expects a hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LENGTH]);

impl Digest {
    /// Wrap an already-computed digest.
    pub fn from_bytes(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Accept a pre-hashed value from a caller. Anything but 32 bytes is
    /// rejected; we never pad or truncate.
    pub fn from_slice(slice: &[u8]) -> Result<Self, EncodingError> {
        let bytes: [u8; DIGEST_LENGTH] = slice
            .try_into()
            .map_err(|_| EncodingError::InvalidDigestLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Parse a hex-encoded digest.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let bytes = hex::decode(s.trim()).map_err(|e| EncodingError::Malformed(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Hash a message into the digest the signature scheme operates over.
///
/// Total: every byte sequence, including the empty one, has a digest.
///
/// # Example
///
/// ```
/// use routstr_auth::crypto::digest;
///
/// let d = digest(b"");
/// assert_eq!(
///     d.to_hex(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn digest(message: &[u8]) -> Digest {
    Digest(sha256(message))
}

/// Plain SHA-256 into a fixed array.
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut output = [0u8; DIGEST_LENGTH];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Digest several slices as if they were concatenated, without allocating
/// the concatenation. Handy for `method || path || body` style messages.
pub fn digest_parts(parts: &[&[u8]]) -> Digest {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; DIGEST_LENGTH];
    output.copy_from_slice(&hasher.finalize());
    Digest(output)
}
