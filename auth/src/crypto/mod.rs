//! # Cryptographic Primitives for the routstr Gate
//!
//! Every request signature the service checks and every assertion it signs
//! goes through here.
//!
//! - **ECDSA over secp256k1** for request authentication and server
//!   attestations, RFC 6979 nonces, low-S only.
//! - **BIP-340 Schnorr** for the node's nostr identity.
//! - **SHA-256** as the one and only message digest.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Field and point arithmetic come from `k256`, which has been
//! audited and fuzzed by people who do this for a living. This module is a
//! thin, strict, typed wrapper: exact lengths, explicit prefixes, a fixed
//! hash, and one error taxonomy.

pub mod error;
pub mod hash;
pub mod keys;
pub mod schnorr;
pub mod signatures;

pub use error::{AuthError, EncodingError, KeyError};
pub use hash::{digest, digest_parts, sha256, Digest};
pub use keys::{derive_public_key, load_private_key, parse_public_key, PrivateKey, PublicKey};
pub use schnorr::{sign_schnorr, verify_schnorr, SchnorrSignature};
pub use signatures::{
    batch_verify, recover_public_key, sign, sign_recoverable, verify, verify_message,
    RecoverableSignature, Signature,
};
