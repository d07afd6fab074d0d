//! # Identifier Newtypes
//!
//! - [`Address`]: 20-byte identity of an attester, recipient, signer or
//!   resolver.
//! - [`SchemaId`]: 32-byte content digest of a registered schema tuple.
//! - [`Uid`]: 32-byte content digest of an attestation record.
//!
//! All three render as `0x`-prefixed lowercase hex and serialize as such, so
//! canonical JSON of a record is stable across implementations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::ContentDigest;
use crate::error::CoreError;
use crate::hex;

macro_rules! hex_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Byte length of this identifier.
            pub const LEN: usize = $len;

            /// Wrap raw bytes.
            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Return the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Parse from hex, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, CoreError> {
                hex::decode_array::<$len>(s, $kind).map(Self)
            }

            /// Render as `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                hex::encode_prefixed(&self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_newtype!(
    /// Identity of a party: attester, recipient, delegated signer, or the
    /// resolver that receives forwarded value.
    Address,
    20,
    "address"
);

hex_newtype!(
    /// Deterministic identifier of a registered schema.
    SchemaId,
    32,
    "schema id"
);

hex_newtype!(
    /// Unique handle of an attestation in the ledger.
    Uid,
    32,
    "uid"
);

impl From<ContentDigest> for SchemaId {
    fn from(d: ContentDigest) -> Self {
        Self(d.0)
    }
}

impl From<ContentDigest> for Uid {
    fn from(d: ContentDigest) -> Self {
        Self(d.0)
    }
}

impl Address {
    /// Derive an address from a 32-byte key digest: the trailing 20 bytes.
    pub fn from_key_digest(digest: &ContentDigest) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.0[12..]);
        Self(bytes)
    }
}
