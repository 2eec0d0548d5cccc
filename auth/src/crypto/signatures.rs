//! # ECDSA Signatures
//!
//! The decision point of the whole gate. A request either carries a
//! signature that checks out against the key it claims, or it doesn't.
//!
//! ## Encodings
//!
//! [`Signature::from_bytes`] dispatches on length:
//!
//! - 64 bytes: compact `r || s`
//! - 65 bytes: recovery id, then `r || s`
//! - anything else up to 72 bytes: strict DER
//!
//! DER signatures are 8 to 72 bytes long, so a 64- or 65-byte input could
//! be either. Input of those lengths that starts with the DER `SEQUENCE`
//! tag (`0x30`) and parses as strict DER is taken as DER; everything else
//! goes through the fixed-width parsers.
//!
//! Parsing checks that `r` and `s` are both in `[1, n-1]` and nothing else.
//! Whether `s` is canonical is a *verification* question, answered with
//! `false`, not a parse error.
//!
//! ## Malleability
//!
//! For every valid `(r, s)` the pair `(r, n - s)` is valid too. We only
//! accept the low half. A high-S signature is rejected outright rather
//! than normalized, so a client can't replay a mutated copy of an old
//! signature as if it were new.
//!
//! ## Timing
//!
//! Nothing secret goes into verification, but we still don't want the
//! *reason* for a `false` to be observable. The curve equation always runs
//! (on the low-S twin when `s` is high), and the canonicality bit is folded
//! in with a constant-time AND afterwards.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use k256::elliptic_curve::scalar::IsHigh;
use k256::elliptic_curve::subtle::Choice;
use std::fmt;

use super::error::{AuthError, EncodingError};
use super::hash::{digest, Digest};
use super::keys::{PrivateKey, PublicKey};
use crate::config::{
    COMPACT_SIGNATURE_LENGTH, MAX_DER_SIGNATURE_LENGTH, RECOVERABLE_SIGNATURE_LENGTH,
};

const DER_SEQUENCE_TAG: u8 = 0x30;

/// An ECDSA signature over a [`Digest`]. `r` and `s` are guaranteed to be
/// in range; `s` may still be high if it came from a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    inner: EcdsaSignature,
}

/// A signature plus the 2-bit hint that lets a verifier reconstruct the
/// signer's public key.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: RecoveryId,
}

impl Signature {
    /// Parse client-supplied signature bytes in any supported encoding.
    /// A recovery id, if present, is validated and then dropped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        match bytes.len() {
            0 => Err(EncodingError::Empty),
            COMPACT_SIGNATURE_LENGTH | RECOVERABLE_SIGNATURE_LENGTH => {
                if bytes[0] == DER_SEQUENCE_TAG {
                    if let Ok(sig) = Self::from_der(bytes) {
                        return Ok(sig);
                    }
                }
                Self::from_fixed_width(bytes)
            }
            len if len <= MAX_DER_SIGNATURE_LENGTH => Self::from_der(bytes),
            len => Err(EncodingError::InvalidLength(len)),
        }
    }

    fn from_fixed_width(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() == RECOVERABLE_SIGNATURE_LENGTH {
            return Ok(RecoverableSignature::from_bytes(bytes)?.signature());
        }
        Self::from_compact(bytes)
    }

    /// Parse 64-byte `r || s`.
    pub fn from_compact(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() != COMPACT_SIGNATURE_LENGTH {
            return Err(EncodingError::InvalidLength(bytes.len()));
        }
        let inner =
            EcdsaSignature::from_slice(bytes).map_err(|_| EncodingError::ScalarOutOfRange)?;
        Ok(Self { inner })
    }

    /// Parse a strict ASN.1 DER `SEQUENCE { INTEGER r, INTEGER s }`.
    pub fn from_der(bytes: &[u8]) -> Result<Self, EncodingError> {
        let inner = EcdsaSignature::from_der(bytes).map_err(|_| EncodingError::MalformedDer)?;
        Ok(Self { inner })
    }

    /// Parse hex in any of the supported encodings.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let bytes = hex::decode(s.trim()).map_err(|e| EncodingError::Malformed(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// 64-byte `r || s`.
    pub fn to_compact(&self) -> [u8; COMPACT_SIGNATURE_LENGTH] {
        let mut out = [0u8; COMPACT_SIGNATURE_LENGTH];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Strict DER, 8 to 72 bytes.
    pub fn to_der(&self) -> Vec<u8> {
        self.inner.to_der().as_bytes().to_vec()
    }

    /// Hex of the compact form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compact())
    }

    /// `r` as 32 big-endian bytes.
    pub fn r(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.to_compact()[..32]);
        out
    }

    /// `s` as 32 big-endian bytes.
    pub fn s(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.to_compact()[32..]);
        out
    }

    /// `true` when `s <= n/2`.
    pub fn is_low_s(&self) -> bool {
        !bool::from(self.high_s())
    }

    /// The other member of the `(r, s)` / `(r, n - s)` pair.
    ///
    /// Both verify the curve equation, but only the low-S one passes
    /// [`verify`]. Exposed for tests and tooling; the gate never calls this
    /// on client input.
    pub fn malleated(&self) -> Self {
        let (r, s) = self.inner.split_scalars();
        let flipped = -*s;
        // -s is nonzero and below n whenever s is, so this cannot fail.
        let inner = EcdsaSignature::from_scalars(r.to_bytes(), flipped.to_bytes())
            .unwrap_or_else(|_| self.inner.clone());
        Self { inner }
    }

    fn high_s(&self) -> Choice {
        self.inner.s().is_high()
    }

    /// The low-S twin, used so the verification equation runs the same way
    /// whatever the S half is.
    fn low_s_twin(&self) -> EcdsaSignature {
        self.inner.normalize_s().unwrap_or_else(|| self.inner.clone())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
    }
}

impl RecoverableSignature {
    /// Parse 65 bytes: recovery id (0..=3) followed by `r || s`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() != RECOVERABLE_SIGNATURE_LENGTH {
            return Err(EncodingError::InvalidLength(bytes.len()));
        }
        let recovery_id =
            RecoveryId::from_byte(bytes[0]).ok_or(EncodingError::InvalidRecoveryId(bytes[0]))?;
        let signature = Signature::from_compact(&bytes[1..])?;
        Ok(Self {
            signature,
            recovery_id,
        })
    }

    /// 65 bytes: recovery id, then `r || s`.
    pub fn to_bytes(&self) -> [u8; RECOVERABLE_SIGNATURE_LENGTH] {
        let mut out = [0u8; RECOVERABLE_SIGNATURE_LENGTH];
        out[0] = self.recovery_id.to_byte();
        out[1..].copy_from_slice(&self.signature.to_compact());
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn signature(&self) -> Signature {
        self.signature.clone()
    }

    pub fn recovery_id(&self) -> u8 {
        self.recovery_id.to_byte()
    }
}

/// Sign a digest with RFC 6979 deterministic nonces.
///
/// Same key, same digest, same signature, every time. The result is always
/// low-S.
///
/// # Example
///
/// ```
/// use routstr_auth::crypto::{digest, sign, verify, PrivateKey};
///
/// let key = PrivateKey::generate();
/// let d = digest(b"GET /v1/models");
/// let sig = sign(&key, &d).unwrap();
/// assert!(verify(&key.public_key(), &d, &sig));
/// ```
pub fn sign(key: &PrivateKey, digest: &Digest) -> Result<Signature, AuthError> {
    let inner: EcdsaSignature = key
        .signing_key()
        .sign_prehash(digest.as_bytes())
        .map_err(|_| AuthError::Signing)?;
    // k256 already emits low-S; normalize anyway so the invariant holds no
    // matter what the backend does.
    let inner = inner.normalize_s().unwrap_or(inner);
    Ok(Signature { inner })
}

/// Sign and keep the recovery id.
pub fn sign_recoverable(
    key: &PrivateKey,
    digest: &Digest,
) -> Result<RecoverableSignature, AuthError> {
    let (inner, recovery_id) = key
        .signing_key()
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|_| AuthError::Signing)?;
    Ok(RecoverableSignature {
        signature: Signature { inner },
        recovery_id,
    })
}

/// Verify a signature over a digest.
///
/// Returns `false` for a wrong key, a wrong digest, a forged signature, and
/// a high-S signature alike. It never errors: by the time you hold a
/// [`Signature`] and a [`PublicKey`], every encoding question is settled.
pub fn verify(public_key: &PublicKey, digest: &Digest, signature: &Signature) -> bool {
    let equation_holds = Choice::from(
        public_key
            .verifying_key()
            .verify_prehash(digest.as_bytes(), &signature.low_s_twin())
            .is_ok() as u8,
    );
    bool::from(equation_holds & !signature.high_s())
}

/// Digest a message and verify in one step.
pub fn verify_message(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    verify(public_key, &digest(message), signature)
}

/// Recover the signer's public key.
///
/// High-S signatures are refused here too, for the same replay reason as in
/// [`verify`].
pub fn recover_public_key(
    digest: &Digest,
    signature: &RecoverableSignature,
) -> Result<PublicKey, AuthError> {
    if !signature.signature.is_low_s() {
        return Err(AuthError::NonCanonicalSignature);
    }
    let verifying_key = VerifyingKey::recover_from_prehash(
        digest.as_bytes(),
        &signature.signature.inner,
        signature.recovery_id,
    )
    .map_err(|_| AuthError::RecoveryFailed)?;
    Ok(PublicKey::from_verifying_key(verifying_key))
}

/// Verify a batch. All or nothing; we don't say which one failed.
///
/// Sequential under the hood. Every item is checked even after a failure so
/// the time taken says nothing about where the bad one was.
pub fn batch_verify(items: &[(PublicKey, Digest, Signature)]) -> bool {
    items
        .iter()
        .fold(true, |ok, (public_key, digest, signature)| {
            verify(public_key, digest, signature) & ok
        })
}
