//! # Key Management
//!
//! secp256k1 key material for the routstr gate: the server's own secret,
//! and the public keys clients present with every request.
//!
//! The heavy lifting (scalar range checks, point decompression, the
//! on-curve test) is done by `k256`. This module adds the strictness the
//! gate needs on top: exact lengths, explicit SEC1 prefixes, and errors
//! that say what was wrong with the bytes.
//!
//! ## Accepted encodings
//!
//! | Key     | Form                        | Length |
//! |---------|-----------------------------|--------|
//! | secret  | raw big-endian scalar       | 32     |
//! | secret  | hex                         | 64 chars |
//! | secret  | NIP-19 `nsec1...`           | bech32 |
//! | public  | SEC1 compressed `02`/`03`   | 33     |
//! | public  | SEC1 uncompressed `04`      | 65     |
//! | public  | NIP-19 `npub1...` (x-only)  | bech32 |
//!
//! ## Security considerations
//!
//! - The secret scalar lives inside a `k256::ecdsa::SigningKey`, which is
//!   zeroized on drop. Intermediate buffers we decode are wiped too.
//! - `Debug` on a [`PrivateKey`] prints the public key. Nothing else.
//! - Keys are immutable after construction. There is no setter, and there
//!   won't be one.

use bech32::{Bech32, Hrp};
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::zeroize::Zeroize;
use k256::FieldBytes;
use rand::rngs::OsRng;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::error::KeyError;
use crate::config::{
    COMPRESSED_PUBLIC_KEY_LENGTH, NPUB_HRP, NSEC_HRP, PRIVATE_KEY_LENGTH,
    UNCOMPRESSED_PUBLIC_KEY_LENGTH, X_ONLY_PUBLIC_KEY_LENGTH,
};

/// SEC1 prefix for a compressed point with even Y.
const TAG_COMPRESSED_EVEN: u8 = 0x02;
/// SEC1 prefix for a compressed point with odd Y.
const TAG_COMPRESSED_ODD: u8 = 0x03;
/// SEC1 prefix for an uncompressed point.
const TAG_UNCOMPRESSED: u8 = 0x04;

/// The server's signing secret: a scalar in `[1, n-1]`.
///
/// Deliberately not `Clone`, not `Serialize`. One copy, owned by whoever
/// constructed the [`ServerSigner`](crate::gate::ServerSigner), dropped (and
/// wiped) when the process is done with it.
///
/// # Examples
///
/// ```
/// use routstr_auth::crypto::keys::PrivateKey;
///
/// let mut secret = [0u8; 32];
/// secret[31] = 1;
/// let key = PrivateKey::from_bytes(&secret).unwrap();
/// assert_eq!(
///     key.public_key().to_hex(),
///     "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
/// );
/// ```
pub struct PrivateKey {
    signing_key: SigningKey,
}

/// A secp256k1 point, either derived from our own secret or presented by a
/// client. Always a valid, non-identity curve point once constructed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PrivateKey {
    /// Generate a fresh key from the OS RNG.
    ///
    /// Only used to mint new server identities. Signing itself never touches
    /// an RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Load a 32-byte big-endian scalar.
    ///
    /// Rejects anything that isn't exactly 32 bytes, the zero scalar, and
    /// scalars at or above the group order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                expected: PRIVATE_KEY_LENGTH,
                got: bytes.len(),
            });
        }
        if bytes.iter().all(|b| *b == 0) {
            return Err(KeyError::ZeroScalar);
        }
        // k256 rejects both zero and >= n here; zero was handled above, so
        // any failure left is the range check.
        let signing_key = SigningKey::from_bytes(FieldBytes::from_slice(bytes))
            .map_err(|_| KeyError::ScalarOutOfRange)?;
        Ok(Self { signing_key })
    }

    /// Load a hex-encoded scalar (64 characters, surrounding whitespace
    /// ignored).
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let mut bytes =
            hex::decode(hex_str.trim()).map_err(|e| KeyError::Malformed(e.to_string()))?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Load a NIP-19 `nsec1...` secret.
    pub fn from_nsec(nsec: &str) -> Result<Self, KeyError> {
        let (hrp, mut data) =
            bech32::decode(nsec.trim()).map_err(|e| KeyError::Malformed(e.to_string()))?;
        if hrp.as_str() != NSEC_HRP {
            data.zeroize();
            return Err(KeyError::Malformed(format!(
                "expected `{}` prefix, got `{}`",
                NSEC_HRP,
                hrp.as_str()
            )));
        }
        let key = Self::from_bytes(&data);
        data.zeroize();
        key
    }

    /// Load the server secret the way operators supply it: either an
    /// `nsec1...` string or 64 hex characters.
    pub fn from_secret_str(secret: &str) -> Result<Self, KeyError> {
        let secret = secret.trim();
        if secret.starts_with(NSEC_HRP) {
            Self::from_nsec(secret)
        } else {
            Self::from_hex(secret)
        }
    }

    /// The public key for this secret. Pure; the same secret always yields
    /// the same point.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: *self.signing_key.verifying_key(),
        }
    }

    /// Export the raw scalar.
    ///
    /// **Handle with care.** This exists so `keytool keygen` can write a key
    /// file. Nothing on the request path should ever call it.
    pub fn secret_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        let mut out = [0u8; PRIVATE_KEY_LENGTH];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// Export as NIP-19 `nsec1...`. Same warning as
    /// [`secret_bytes`](Self::secret_bytes).
    pub fn to_nsec(&self) -> String {
        let mut secret = self.secret_bytes();
        let encoded = encode_bech32(NSEC_HRP, &secret);
        secret.zeroize();
        encoded
    }

    /// Borrow the underlying `k256` key for the signing module.
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only. A partial leak is still a leak.
        write!(f, "PrivateKey(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Parse a SEC1 encoded point.
    ///
    /// Accepts 33 bytes with a `0x02`/`0x03` prefix or 65 bytes with `0x04`.
    /// The hybrid `0x06`/`0x07` forms and the identity encoding are refused.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let Some(&tag) = bytes.first() else {
            return Err(KeyError::InvalidLength {
                expected: COMPRESSED_PUBLIC_KEY_LENGTH,
                got: 0,
            });
        };
        let expected = match tag {
            TAG_COMPRESSED_EVEN | TAG_COMPRESSED_ODD => COMPRESSED_PUBLIC_KEY_LENGTH,
            TAG_UNCOMPRESSED => UNCOMPRESSED_PUBLIC_KEY_LENGTH,
            other => return Err(KeyError::InvalidPrefix(other)),
        };
        if bytes.len() != expected {
            return Err(KeyError::InvalidLength {
                expected,
                got: bytes.len(),
            });
        }
        let verifying_key =
            VerifyingKey::from_sec1_bytes(bytes).map_err(|_| KeyError::NotOnCurve)?;
        Ok(Self { verifying_key })
    }

    /// Parse a hex-encoded SEC1 point.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|e| KeyError::Malformed(e.to_string()))?;
        Self::from_sec1_bytes(&bytes)
    }

    /// Lift a 32-byte x-only key to the point with even Y, per BIP-340.
    pub fn from_x_only(x: &[u8]) -> Result<Self, KeyError> {
        if x.len() != X_ONLY_PUBLIC_KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                expected: X_ONLY_PUBLIC_KEY_LENGTH,
                got: x.len(),
            });
        }
        let mut sec1 = [0u8; COMPRESSED_PUBLIC_KEY_LENGTH];
        sec1[0] = TAG_COMPRESSED_EVEN;
        sec1[1..].copy_from_slice(x);
        Self::from_sec1_bytes(&sec1)
    }

    /// Parse a NIP-19 `npub1...` string.
    pub fn from_npub(npub: &str) -> Result<Self, KeyError> {
        let (hrp, data) =
            bech32::decode(npub.trim()).map_err(|e| KeyError::Malformed(e.to_string()))?;
        if hrp.as_str() != NPUB_HRP {
            return Err(KeyError::Malformed(format!(
                "expected `{}` prefix, got `{}`",
                NPUB_HRP,
                hrp.as_str()
            )));
        }
        Self::from_x_only(&data)
    }

    /// 33-byte compressed SEC1 encoding.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_PUBLIC_KEY_LENGTH] {
        let point = self.verifying_key.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_PUBLIC_KEY_LENGTH];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// 65-byte uncompressed SEC1 encoding.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH] {
        let point = self.verifying_key.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_PUBLIC_KEY_LENGTH];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// The X coordinate alone, as BIP-340 and nostr use it.
    pub fn x_only(&self) -> [u8; X_ONLY_PUBLIC_KEY_LENGTH] {
        let mut out = [0u8; X_ONLY_PUBLIC_KEY_LENGTH];
        out.copy_from_slice(&self.to_compressed()[1..]);
        out
    }

    /// Compressed hex, 66 characters. The canonical text form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// NIP-19 `npub1...` of the x-only key.
    pub fn to_npub(&self) -> String {
        encode_bech32(NPUB_HRP, &self.x_only())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub(crate) fn from_verifying_key(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_compressed().hash(state);
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

/// Load the server secret from raw bytes.
pub fn load_private_key(bytes: &[u8]) -> Result<PrivateKey, KeyError> {
    PrivateKey::from_bytes(bytes)
}

/// Derive the public key for a secret.
pub fn derive_public_key(key: &PrivateKey) -> PublicKey {
    key.public_key()
}

/// Parse a client-presented SEC1 public key.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, KeyError> {
    PublicKey::from_sec1_bytes(bytes)
}

fn encode_bech32(hrp: &str, data: &[u8]) -> String {
    // Both prefixes are compile-time constants and the payload is 32 bytes,
    // far below the bech32 length limit, so neither step can fail.
    let hrp = Hrp::parse_unchecked(hrp);
    bech32::encode::<Bech32>(hrp, data).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generator point G: the public key of secret 1.
    const G_COMPRESSED: &str =
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_UNCOMPRESSED: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    fn key_one() -> PrivateKey {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        PrivateKey::from_bytes(&secret).unwrap()
    }

    #[test]
    fn test_key_one_derives_generator() {
        let pk = key_one().public_key();
        assert_eq!(pk.to_hex(), G_COMPRESSED);
        assert_eq!(hex::encode(pk.to_uncompressed()), G_UNCOMPRESSED);
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert_eq!(
            PrivateKey::from_bytes(&[0u8; 32]).unwrap_err(),
            KeyError::ZeroScalar
        );
    }

    #[test]
    fn test_curve_order_rejected() {
        assert_eq!(
            PrivateKey::from_bytes(&crate::config::CURVE_ORDER).unwrap_err(),
            KeyError::ScalarOutOfRange
        );
        assert_eq!(
            PrivateKey::from_bytes(&[0xFF; 32]).unwrap_err(),
            KeyError::ScalarOutOfRange
        );
    }

    #[test]
    fn test_largest_scalar_accepted() {
        let mut n_minus_one = crate::config::CURVE_ORDER;
        n_minus_one[31] -= 1;
        assert!(PrivateKey::from_bytes(&n_minus_one).is_ok());
    }

    #[test]
    fn test_wrong_secret_length_rejected() {
        assert_eq!(
            PrivateKey::from_bytes(&[1u8; 31]).unwrap_err(),
            KeyError::InvalidLength {
                expected: 32,
                got: 31
            }
        );
        assert!(PrivateKey::from_bytes(&[1u8; 33]).is_err());
        assert!(PrivateKey::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_secret_hex_roundtrip() {
        let kp = PrivateKey::generate();
        let restored = PrivateKey::from_hex(&hex::encode(kp.secret_bytes())).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(PrivateKey::from_hex("deadbeef").is_err());
        assert!(matches!(
            PrivateKey::from_hex("not-hex-at-all"),
            Err(KeyError::Malformed(_))
        ));
    }

    #[test]
    fn test_nsec_roundtrip() {
        let kp = PrivateKey::generate();
        let nsec = kp.to_nsec();
        assert!(nsec.starts_with("nsec1"));
        let restored = PrivateKey::from_nsec(&nsec).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn test_nsec_rejects_npub() {
        let npub = PrivateKey::generate().public_key().to_npub();
        assert!(matches!(
            PrivateKey::from_nsec(&npub),
            Err(KeyError::Malformed(_))
        ));
    }

    #[test]
    fn test_secret_str_accepts_both_forms() {
        let kp = key_one();
        let from_hex =
            PrivateKey::from_secret_str(&format!("  {}\n", hex::encode(kp.secret_bytes())))
                .unwrap();
        let from_nsec = PrivateKey::from_secret_str(&kp.to_nsec()).unwrap();
        assert_eq!(from_hex.public_key(), kp.public_key());
        assert_eq!(from_nsec.public_key(), kp.public_key());
    }

    #[test]
    fn test_parse_compressed_and_uncompressed_agree() {
        let compressed = PublicKey::from_hex(G_COMPRESSED).unwrap();
        let uncompressed = PublicKey::from_hex(G_UNCOMPRESSED).unwrap();
        assert_eq!(compressed, uncompressed);
    }

    #[test]
    fn test_public_key_roundtrip() {
        let pk = PrivateKey::generate().public_key();
        assert_eq!(parse_public_key(&pk.to_compressed()).unwrap(), pk);
        assert_eq!(parse_public_key(&pk.to_uncompressed()).unwrap(), pk);
    }

    #[test]
    fn test_bad_prefix_rejected() {
        let mut bytes = key_one().public_key().to_compressed();
        bytes[0] = 0x05;
        assert_eq!(
            parse_public_key(&bytes).unwrap_err(),
            KeyError::InvalidPrefix(0x05)
        );
        // Hybrid encodings are not accepted either.
        let mut hybrid = key_one().public_key().to_uncompressed();
        hybrid[0] = 0x06;
        assert_eq!(
            parse_public_key(&hybrid).unwrap_err(),
            KeyError::InvalidPrefix(0x06)
        );
    }

    #[test]
    fn test_prefix_length_mismatch_rejected() {
        let compressed = key_one().public_key().to_compressed();
        let mut wrong = compressed.to_vec();
        wrong[0] = 0x04;
        assert_eq!(
            parse_public_key(&wrong).unwrap_err(),
            KeyError::InvalidLength {
                expected: 65,
                got: 33
            }
        );
        assert!(parse_public_key(&[]).is_err());
    }

    #[test]
    fn test_point_off_curve_rejected() {
        // (1, 1) does not satisfy y^2 = x^3 + 7.
        let mut bytes = [0u8; 65];
        bytes[0] = 0x04;
        bytes[32] = 1;
        bytes[64] = 1;
        assert_eq!(parse_public_key(&bytes).unwrap_err(), KeyError::NotOnCurve);
    }

    #[test]
    fn test_npub_roundtrip_preserves_x() {
        let pk = PrivateKey::generate().public_key();
        let lifted = PublicKey::from_npub(&pk.to_npub()).unwrap();
        assert_eq!(lifted.x_only(), pk.x_only());
        // The lifted point always has even Y.
        assert_eq!(lifted.to_compressed()[0], 0x02);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = derive_public_key(&key_one());
        let b = derive_public_key(&load_private_key(&key_one().secret_bytes()).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = key_one();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("PrivateKey(pub="));
        assert!(!debug_str.contains(&hex::encode(kp.secret_bytes())));
    }

    #[test]
    fn test_two_generated_keys_are_different() {
        assert_ne!(
            PrivateKey::generate().public_key(),
            PrivateKey::generate().public_key()
        );
    }
}
