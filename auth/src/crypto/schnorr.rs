//! # BIP-340 Schnorr
//!
//! The routstr node's public identity is a nostr key (`npub`), and nostr
//! speaks BIP-340, not ECDSA. Same curve, same secret, different signature
//! scheme and an x-only public key.
//!
//! Auxiliary randomness is fixed to zero, which BIP-340 permits. That keeps
//! signing deterministic like the ECDSA path: reproducible, auditable, and
//! with no RNG on the hot path.

use k256::schnorr::{
    Signature as SchnorrInner, SigningKey as SchnorrSigningKey,
    VerifyingKey as SchnorrVerifyingKey,
};
use std::fmt;

use super::error::{AuthError, EncodingError, KeyError};
use super::hash::Digest;
use super::keys::PrivateKey;
use crate::config::{SCHNORR_SIGNATURE_LENGTH, X_ONLY_PUBLIC_KEY_LENGTH};

const ZERO_AUX_RAND: [u8; 32] = [0u8; 32];

/// A 64-byte BIP-340 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct SchnorrSignature {
    bytes: [u8; SCHNORR_SIGNATURE_LENGTH],
}

impl SchnorrSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let bytes: [u8; SCHNORR_SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| EncodingError::InvalidLength(bytes.len()))?;
        // Let k256 range-check r and s now rather than at verify time.
        SchnorrInner::try_from(bytes.as_slice()).map_err(|_| EncodingError::ScalarOutOfRange)?;
        Ok(Self { bytes })
    }

    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let bytes = hex::decode(s.trim()).map_err(|e| EncodingError::Malformed(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SCHNORR_SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for SchnorrSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "SchnorrSignature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

/// Sign a digest with BIP-340.
pub fn sign_schnorr(key: &PrivateKey, digest: &Digest) -> Result<SchnorrSignature, AuthError> {
    let mut secret = key.secret_bytes();
    let signing_key = SchnorrSigningKey::from_bytes(&secret);
    k256::elliptic_curve::zeroize::Zeroize::zeroize(&mut secret);
    let signing_key = signing_key.map_err(|_| AuthError::Signing)?;
    let signature = signing_key
        .sign_raw(digest.as_bytes(), &ZERO_AUX_RAND)
        .map_err(|_| AuthError::Signing)?;
    let mut bytes = [0u8; SCHNORR_SIGNATURE_LENGTH];
    bytes.copy_from_slice(&signature.to_bytes());
    Ok(SchnorrSignature { bytes })
}

/// Verify a BIP-340 signature against a 32-byte x-only key.
///
/// A malformed key is an error; a signature that doesn't check out is
/// `Ok(false)`.
pub fn verify_schnorr(
    x_only_public_key: &[u8],
    digest: &Digest,
    signature: &SchnorrSignature,
) -> Result<bool, AuthError> {
    if x_only_public_key.len() != X_ONLY_PUBLIC_KEY_LENGTH {
        return Err(KeyError::InvalidLength {
            expected: X_ONLY_PUBLIC_KEY_LENGTH,
            got: x_only_public_key.len(),
        }
        .into());
    }
    let verifying_key =
        SchnorrVerifyingKey::from_bytes(x_only_public_key).map_err(|_| KeyError::NotOnCurve)?;
    let inner = SchnorrInner::try_from(signature.bytes.as_slice())
        .map_err(|_| EncodingError::ScalarOutOfRange)?;
    Ok(verifying_key
        .verify_raw(digest.as_bytes(), &inner)
        .is_ok())
}
