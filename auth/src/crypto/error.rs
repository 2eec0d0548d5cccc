//! # Error Taxonomy
//!
//! Two ways a call can fail before any cryptography happens: the key is bad,
//! or the signature bytes are bad. A signature that parses but doesn't check
//! out is *not* an error here. It's a `false`, and it's routine.
//!
//! The inner enums say what was wrong with the input bytes. They never say
//! anything about the secret scalar beyond "zero" or "out of range", which
//! is public knowledge for any rejected value anyway.

use thiserror::Error;

/// Why a key was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("wrong key length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("secret scalar is zero")]
    ZeroScalar,

    #[error("secret scalar is not below the curve order")]
    ScalarOutOfRange,

    #[error("unknown public key prefix 0x{0:02x}")]
    InvalidPrefix(u8),

    #[error("public key is not a point on secp256k1")]
    NotOnCurve,

    #[error("malformed key text: {0}")]
    Malformed(String),
}

/// Why signature (or digest) bytes could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("empty signature")]
    Empty,

    #[error("unsupported signature length {0}")]
    InvalidLength(usize),

    #[error("malformed DER signature")]
    MalformedDer,

    #[error("r or s is zero or not below the curve order")]
    ScalarOutOfRange,

    #[error("recovery id {0} out of range")]
    InvalidRecoveryId(u8),

    #[error("digest must be 32 bytes, got {0}")]
    InvalidDigestLength(usize),

    #[error("malformed signature text: {0}")]
    Malformed(String),
}

/// The error every public entry point of the gate returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(#[from] EncodingError),

    /// `s` is in the upper half of the curve order. Valid scalars, but not a
    /// form this service accepts.
    #[error("signature is not in low-S form")]
    NonCanonicalSignature,

    /// The signature and digest do not determine a point on the curve.
    #[error("no public key recovers from this signature and digest")]
    RecoveryFailed,

    /// The signing backend refused a validated key and digest. Not reachable
    /// in practice; kept so signing never has to panic.
    #[error("signing failed")]
    Signing,
}

impl AuthError {
    /// `true` for errors caused by the caller's input rather than by us.
    /// The HTTP layer maps these onto 4xx responses.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Signing)
    }
}
