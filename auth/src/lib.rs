// Copyright (c) 2026 Routstr contributors. MIT License.
// See LICENSE for details.

//! # routstr-auth
//!
//! The cryptographic gate in front of the routstr API: it decides whether a
//! request signature is valid, and it signs the node's own assertions.
//!
//! secp256k1 all the way down. ECDSA for request authentication and
//! attestations, BIP-340 Schnorr for the node's nostr identity, SHA-256 as
//! the fixed message digest. Curve arithmetic is `k256`'s job, not ours.
//!
//! ## Architecture
//!
//! - **crypto** — Keys, digests, ECDSA, Schnorr, and the error taxonomy.
//! - **gate** — The request gate and the server signer the HTTP layer holds.
//! - **config** — Algorithm names, lengths, curve order, env var names.
//!
//! ## Design Philosophy
//!
//! 1. Fail closed. Anything that isn't provably valid is `false` or an error.
//! 2. No unsafe code. None.
//! 3. No global state. The server key is a value you construct and pass.
//! 4. A bad signature is routine, not an incident.

pub mod config;
pub mod crypto;
pub mod gate;

pub use crypto::{AuthError, Digest, PrivateKey, PublicKey, Signature};
pub use gate::{Attestation, RequestGate, ServerSigner};
