//! # attest-crypto: Signing Primitives
//!
//! Ed25519 key pairs, public keys and signatures used to authorize
//! delegated attestations and revocations.
//!
//! - Signing input is always `&CanonicalBytes`; raw byte slices cannot be
//!   signed.
//! - A signer's [`Address`](attest_core::Address) is derived from its public
//!   key, so "recovering" a signer means verifying under the supplied key
//!   and deriving that key's address.
//!
//! ## Crate Policy
//!
//! - Depends only on `attest-core` internally.
//! - Tests use real Ed25519; nothing is mocked.

pub mod ed25519;
pub mod error;

pub use ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
