//! # Request Gate & Server Signer
//!
//! The two things the HTTP layer actually calls.
//!
//! [`RequestGate`] takes the raw bytes a client sent (public key, message,
//! signature) and says yes or no. Malformed keys and signatures come back as
//! [`AuthError`]s the caller maps to a 4xx. A well-formed signature that
//! doesn't verify is `Ok(false)`: routine, and logged at `debug` only.
//!
//! [`ServerSigner`] holds the server's secret for the life of the process
//! and signs the service's own assertions. It is built once at startup and
//! shared by reference (`Arc<ServerSigner>`) with every worker. Nothing in
//! it is ever mutated, so there's nothing to lock.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SIGNING_ALGORITHM;
use crate::crypto::error::{AuthError, EncodingError};
use crate::crypto::hash::{digest, Digest};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::schnorr::{sign_schnorr, SchnorrSignature};
use crate::crypto::signatures::{sign, verify, Signature};

/// The server's signing identity.
#[derive(Debug)]
pub struct ServerSigner {
    key: PrivateKey,
    public_key: PublicKey,
}

/// A server-issued statement that a message came from this node.
///
/// Everything is hex so it can ride along in a JSON body or a header without
/// further thought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub algorithm: String,
    pub public_key: String,
    pub digest: String,
    pub signature: String,
}

impl ServerSigner {
    /// Take ownership of the validated server key.
    pub fn new(key: PrivateKey) -> Self {
        let public_key = key.public_key();
        info!(public_key = %public_key, "server signer ready");
        Self { key, public_key }
    }

    /// Build a signer straight from the operator-supplied secret string
    /// (`nsec1...` or hex).
    pub fn from_secret_str(secret: &str) -> Result<Self, AuthError> {
        Ok(Self::new(PrivateKey::from_secret_str(secret)?))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn npub(&self) -> String {
        self.public_key.to_npub()
    }

    /// Sign an already-computed digest.
    pub fn sign_digest(&self, digest: &Digest) -> Result<Signature, AuthError> {
        sign(&self.key, digest)
    }

    /// BIP-340 signature under the node's nostr identity.
    pub fn sign_schnorr(&self, digest: &Digest) -> Result<SchnorrSignature, AuthError> {
        sign_schnorr(&self.key, digest)
    }

    /// Digest and sign a message, packaged for the wire.
    pub fn attest(&self, message: &[u8]) -> Result<Attestation, AuthError> {
        let digest = digest(message);
        let signature = self.sign_digest(&digest)?;
        debug!(digest = %digest, "attestation issued");
        Ok(Attestation {
            algorithm: SIGNING_ALGORITHM.to_string(),
            public_key: self.public_key.to_hex(),
            digest: digest.to_hex(),
            signature: signature.to_hex(),
        })
    }
}

impl Attestation {
    /// Check the attestation against the key it names.
    ///
    /// This only proves the embedded key signed the embedded digest. Whether
    /// that key is one you trust is your call; compare
    /// [`signer`](Self::signer) against a known key.
    pub fn verify(&self) -> Result<bool, AuthError> {
        if self.algorithm != SIGNING_ALGORITHM {
            return Err(EncodingError::Malformed(format!(
                "unsupported algorithm `{}`",
                self.algorithm
            ))
            .into());
        }
        let public_key = self.signer()?;
        let digest = Digest::from_hex(&self.digest)?;
        let signature = Signature::from_hex(&self.signature)?;
        Ok(verify(&public_key, &digest, &signature))
    }

    /// `verify` plus a check that the digest is the one for `message`.
    pub fn verify_message(&self, message: &[u8]) -> Result<bool, AuthError> {
        let claimed = Digest::from_hex(&self.digest)?;
        let valid = self.verify()?;
        Ok(valid & (claimed == digest(message)))
    }

    pub fn signer(&self) -> Result<PublicKey, AuthError> {
        Ok(PublicKey::from_hex(&self.public_key)?)
    }
}

/// Checks client signatures. Stateless; a unit struct so it can sit in
/// whatever application state the HTTP layer keeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestGate;

impl RequestGate {
    pub fn new() -> Self {
        Self
    }

    /// Verify a raw request: SEC1 public key, message bytes, signature bytes
    /// in any supported encoding.
    pub fn check(
        &self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, AuthError> {
        self.check_prehashed(public_key, &digest(message), signature)
    }

    /// Same as [`check`](Self::check) for callers that already hold the
    /// digest.
    pub fn check_prehashed(
        &self,
        public_key: &[u8],
        digest: &Digest,
        signature: &[u8],
    ) -> Result<bool, AuthError> {
        let public_key = PublicKey::from_sec1_bytes(public_key)?;
        let signature = Signature::from_bytes(signature)?;
        let valid = verify(&public_key, digest, &signature);
        if !valid {
            // Business as usual. Don't say why.
            debug!(public_key = %public_key, "request signature rejected");
        }
        Ok(valid)
    }
}
