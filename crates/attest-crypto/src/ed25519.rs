//! # Ed25519 Signing and Verification
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&CanonicalBytes`. A delegation message signed by
//!   one implementation verifies in another only if both canonicalize the
//!   same JSON shape.
//! - Private keys are never serialized or logged. `Ed25519KeyPair` does not
//!   implement `Serialize` and its `Debug` output is redacted.
//!
//! Public keys and signatures serialize as lowercase hex strings.

use attest_core::{hex, Address, CanonicalBytes, ContentDigest};
use ed25519_dalek::{Signer as _, Verifier as _};
use serde::de::Error as _;
use sha2::Digest as _;

use crate::error::CryptoError;

/// Fixed-width byte wrapper carried as bare lowercase hex on the wire.
macro_rules! hex_wire_bytes {
    ($name:ident, $len:literal, $what:literal) => {
        impl $name {
            /// Raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Unprefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                hex::encode(&self.0)
            }

            #[doc = concat!("Parse ", $what, " from hex; a `0x` prefix is tolerated.")]
            pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
                match hex::decode_array::<$len>(s, $what) {
                    Ok(bytes) => Ok(Self(bytes)),
                    Err(e) => Err(CryptoError::HexDecode(e.to_string())),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
                ser.collect_str(&format_args!("{}", self.to_hex()))
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
                let text = <std::borrow::Cow<'de, str>>::deserialize(de)?;
                Self::from_hex(&text).map_err(D::Error::custom)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // A short prefix is enough to tell values apart in logs.
                write!(f, concat!(stringify!($name), "({}..)"), hex::encode(&self.0[..4]))
            }
        }
    };
}

/// An Ed25519 verifying key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

/// A detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature(pub [u8; 64]);

hex_wire_bytes!(Ed25519PublicKey, 32, "public key");
hex_wire_bytes!(Ed25519Signature, 64, "signature");

impl Ed25519PublicKey {
    /// Identity of whoever holds the matching secret: the last 20 bytes
    /// of SHA-256 over the key.
    pub fn address(&self) -> Address {
        let digest = ContentDigest(sha2::Sha256::digest(self.0).into());
        Address::from_key_digest(&digest)
    }

    /// Decompress into a dalek key. Fails for byte strings that are not a
    /// curve point.
    pub fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Secret signing key. Deliberately neither `Clone` nor `Serialize`.
pub struct Ed25519KeyPair {
    secret: ed25519_dalek::SigningKey,
}

impl Ed25519KeyPair {
    /// Fresh key from the OS entropy source.
    pub fn generate() -> Self {
        Self {
            secret: ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    /// Deterministic key from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            secret: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Matching verifying key.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.secret.verifying_key().to_bytes())
    }

    /// Address of [`Self::public_key`].
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign a canonical message.
    pub fn sign(&self, message: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.secret.sign(message.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Ed25519KeyPair").field(&"<private>").finish()
    }
}

/// Check `signature` over `message` under `key`.
pub fn verify(
    message: &CanonicalBytes,
    signature: &Ed25519Signature,
    key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let detached = ed25519_dalek::Signature::from_bytes(&signature.0);
    key.to_verifying_key()?
        .verify(message.as_bytes(), &detached)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}
