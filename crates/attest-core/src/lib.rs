//! # attest-core: Foundational Types for the Attestation Protocol
//!
//! This crate is the leaf of the workspace DAG. It defines the primitives
//! every other crate builds on: identifiers, canonical bytes, digests,
//! timestamps with an injectable clock, and the attestation record types
//! that flow between the registry, the resolvers, and the engine.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `Address`, `SchemaId` and `Uid`
//!    are distinct types. A schema id cannot be passed where an attestation
//!    uid is expected.
//!
//! 2. **`CanonicalBytes` newtype.** Every digest and every signed delegation
//!    message is computed over `CanonicalBytes::new()` output (RFC 8785 JCS).
//!
//! 3. **Absence is `Option`, not a zero sentinel.** "No recipient", "never
//!    expires" and "not revoked" are `None`.
//!
//! 4. **Time is injected.** Nothing in the engine reads the wall clock
//!    directly; it asks a [`Clock`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `attest-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod attestation;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod hex;
pub mod identity;
pub mod temporal;

pub use attestation::{
    Attestation, AttestationRequest, AttestationStatus, CallContext, RevocationRequest,
};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, CoreError};
pub use identity::{Address, SchemaId, Uid};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
