//! # attest-state: Attestation Lifecycle Engine
//!
//! [`AttestationEngine`] accepts attestation and revocation requests, runs
//! each through its schema's resolver, and persists them atomically.
//!
//! ## Modules
//!
//! - **engine**: single, batch and delegated attest/revoke plus read
//!   accessors.
//! - **ledger**: committed records, the per-call staging buffer and uid
//!   derivation.
//! - **value**: per-resolver forwarded value.
//! - **delegation**: signed message format, signing helpers, and the
//!   signature/deadline/nonce verifier.
//! - **config**: engine settings loaded from YAML.
//! - **error**: the [`AttestError`] taxonomy.
//!
//! ## Observability
//!
//! Commits log at `info`, staging steps at `debug`, rejections at `warn`.
//! Counters: `attest_attestations_total`, `attest_revocations_total` and
//! `attest_rejections_total{kind}`. No recorder is installed here; the
//! host process decides where metrics go.

pub mod config;
pub mod delegation;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod value;

pub use config::{ConfigError, EngineConfig};
pub use delegation::{
    attestation_message, revocation_message, sign_attestation, sign_revocation,
    DelegatedAttestation, DelegatedRevocation, DelegatedSignature, DelegationDomain,
    DelegationVerifier,
};
pub use engine::AttestationEngine;
pub use error::AttestError;
pub use ledger::{derive_uid, AttestationLedger, Staging};
pub use value::ValueLedger;
