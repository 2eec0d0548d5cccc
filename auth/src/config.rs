//! # Authentication Constants
//!
//! Every magic number the gate depends on lives here. Several of these are
//! baked into signatures that have already been handed to clients, so
//! changing them is a breaking change for every issued attestation.

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Environment variable holding the server secret (hex or `nsec1...`).
pub const SECRET_KEY_ENV: &str = "NSEC";

/// Environment variable pointing at a file that holds the server secret.
pub const SECRET_KEY_FILE_ENV: &str = "ROUTSTR_KEY_FILE";

// ---------------------------------------------------------------------------
// Signature Scheme
// ---------------------------------------------------------------------------

/// ECDSA over secp256k1 with RFC 6979 nonces. The one curve we speak.
pub const SIGNING_ALGORITHM: &str = "ECDSA-secp256k1-SHA256";

/// BIP-340 Schnorr, used for the node's nostr identity.
pub const SCHNORR_ALGORITHM: &str = "BIP340-secp256k1";

/// Hash applied to every message before signing or verification.
///
/// This is a versioned constant, not a knob. Swapping it invalidates every
/// signature ever issued by this service.
pub const DIGEST_ALGORITHM: &str = "SHA-256";

/// Bumped together with [`DIGEST_ALGORITHM`], never independently.
pub const DIGEST_VERSION: u8 = 1;

/// Digest output length in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// Secret scalar length in bytes.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// SEC1 compressed point: prefix byte plus X.
pub const COMPRESSED_PUBLIC_KEY_LENGTH: usize = 33;

/// SEC1 uncompressed point: prefix byte plus X and Y.
pub const UNCOMPRESSED_PUBLIC_KEY_LENGTH: usize = 65;

/// BIP-340 x-only public key length.
pub const X_ONLY_PUBLIC_KEY_LENGTH: usize = 32;

/// Compact `r || s` ECDSA signature.
pub const COMPACT_SIGNATURE_LENGTH: usize = 64;

/// Recovery id byte followed by the compact signature.
pub const RECOVERABLE_SIGNATURE_LENGTH: usize = 65;

/// Upper bound on a DER-encoded ECDSA signature over secp256k1.
pub const MAX_DER_SIGNATURE_LENGTH: usize = 72;

/// BIP-340 signature length.
pub const SCHNORR_SIGNATURE_LENGTH: usize = 64;

/// The secp256k1 group order n, big-endian.
pub const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

// ---------------------------------------------------------------------------
// NIP-19 bech32 prefixes
// ---------------------------------------------------------------------------

/// Human-readable prefix of a bech32 nostr secret key.
pub const NSEC_HRP: &str = "nsec";

/// Human-readable prefix of a bech32 nostr public key.
pub const NPUB_HRP: &str = "npub";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_lengths_are_consistent() {
        assert_eq!(COMPRESSED_PUBLIC_KEY_LENGTH, 1 + PRIVATE_KEY_LENGTH);
        assert_eq!(UNCOMPRESSED_PUBLIC_KEY_LENGTH, 1 + 2 * PRIVATE_KEY_LENGTH);
        assert_eq!(COMPACT_SIGNATURE_LENGTH, 2 * DIGEST_LENGTH);
        assert_eq!(RECOVERABLE_SIGNATURE_LENGTH, COMPACT_SIGNATURE_LENGTH + 1);
    }

    #[test]
    fn test_curve_order_matches_k256() {
        // n itself is out of range, n - 1 is the largest valid scalar.
        assert!(k256::SecretKey::from_slice(&CURVE_ORDER).is_err());
        let mut n_minus_one = CURVE_ORDER;
        n_minus_one[31] -= 1;
        assert!(k256::SecretKey::from_slice(&n_minus_one).is_ok());
    }

    #[test]
    fn test_digest_algorithm_is_pinned() {
        // If this changes, every outstanding attestation breaks.
        assert_eq!(DIGEST_ALGORITHM, "SHA-256");
        assert_eq!(DIGEST_VERSION, 1);
    }
}
