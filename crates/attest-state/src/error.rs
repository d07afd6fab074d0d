//! # Engine Errors
//!
//! One taxonomy for every engine operation. A batch surfaces exactly one
//! of these: the first failure in submission order.
//!
//! Resolver rejections are not distinguished from resolver malfunctions;
//! both are [`AttestError::InvalidAttestation`].

use attest_core::{Address, CanonicalizationError, SchemaId, Timestamp, Uid};
use attest_schema::RegistryError;
use thiserror::Error;

/// Errors from attestation, revocation and delegated submission.
#[derive(Error, Debug)]
pub enum AttestError {
    /// The request names a schema that is not registered.
    #[error("schema {0} not found")]
    SchemaNotFound(SchemaId),

    /// Resolver rejection or malformed request.
    #[error("invalid attestation: {0}")]
    InvalidAttestation(String),

    /// No attestation with this uid.
    #[error("attestation {0} not found")]
    NotFound(Uid),

    /// The attestation was made under an irrevocable schema.
    #[error("attestation {0} is not revocable")]
    NotRevocable(Uid),

    /// The attestation has already been revoked.
    #[error("attestation {0} is already revoked")]
    AlreadyRevoked(Uid),

    /// The submitter is not the original attester.
    #[error("{sender} is not the attester of {uid}")]
    Unauthorized {
        /// Target attestation.
        uid: Uid,
        /// Party that attempted the revocation.
        sender: Address,
    },

    /// The delegated signature does not verify or names another signer.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The delegated signature's deadline has passed.
    #[error("signature expired at {deadline} (now {now})")]
    ExpiredSignature {
        /// Signed deadline.
        deadline: Timestamp,
        /// Engine time at verification.
        now: Timestamp,
    },

    /// The delegated nonce is not the signer's next unused nonce.
    #[error("invalid nonce for {signer}: expected {expected}, got {got}")]
    InvalidNonce {
        /// Delegated signer.
        signer: Address,
        /// Next unused nonce.
        expected: u64,
        /// Nonce carried by the request.
        got: u64,
    },

    /// Attached value differs from the sum of per-item values.
    #[error("value mismatch: attached {attached}, requests declare {declared:?}")]
    ValueMismatch {
        /// Value attached to the call.
        attached: u64,
        /// Sum of per-item values, `None` on overflow.
        declared: Option<u64>,
    },

    /// Duplicate schema registration.
    #[error("schema {0} already exists")]
    AlreadyExists(SchemaId),

    /// Value was sent to a schema whose resolver does not accept it.
    #[error("schema {0} does not accept value")]
    NotPayable(SchemaId),

    /// The target or referenced attestation has expired.
    #[error("attestation {0} has expired")]
    Expired(Uid),

    /// A new attestation's expiration is not in the future.
    #[error("expiration time {expiration} is not after {now}")]
    InvalidExpirationTime {
        /// Requested expiration.
        expiration: Timestamp,
        /// Engine time at validation.
        now: Timestamp,
    },

    /// A batch call carried no items.
    #[error("batch is empty")]
    EmptyBatch,

    /// A batch call exceeded the configured size.
    #[error("batch of {size} exceeds maximum {max}")]
    BatchTooLarge {
        /// Items submitted.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Schema definition rejected by the registry.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Identifier or message derivation failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl AttestError {
    /// Stable name of the error kind, e.g. `"InvalidAttestation"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchemaNotFound(_) => "SchemaNotFound",
            Self::InvalidAttestation(_) => "InvalidAttestation",
            Self::NotFound(_) => "NotFound",
            Self::NotRevocable(_) => "NotRevocable",
            Self::AlreadyRevoked(_) => "AlreadyRevoked",
            Self::Unauthorized { .. } => "Unauthorized",
            Self::InvalidSignature(_) => "InvalidSignature",
            Self::ExpiredSignature { .. } => "ExpiredSignature",
            Self::InvalidNonce { .. } => "InvalidNonce",
            Self::ValueMismatch { .. } => "ValueMismatch",
            Self::AlreadyExists(_) => "AlreadyExists",
            Self::NotPayable(_) => "NotPayable",
            Self::Expired(_) => "Expired",
            Self::InvalidExpirationTime { .. } => "InvalidExpirationTime",
            Self::EmptyBatch => "EmptyBatch",
            Self::BatchTooLarge { .. } => "BatchTooLarge",
            Self::InvalidSchema(_) => "InvalidSchema",
            Self::Canonicalization(_) => "Canonicalization",
        }
    }
}

impl From<RegistryError> for AttestError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyExists(id) => Self::AlreadyExists(id),
            RegistryError::NotFound(id) => Self::SchemaNotFound(id),
            RegistryError::InvalidSchema(msg) => Self::InvalidSchema(msg),
            RegistryError::Canonicalization(e) => Self::Canonicalization(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_not_found_maps_to_schema_not_found() {
        let err: AttestError = RegistryError::NotFound(SchemaId([1; 32])).into();
        assert_eq!(err.kind(), "SchemaNotFound");
    }

    #[test]
    fn value_mismatch_display() {
        let err = AttestError::ValueMismatch {
            attached: 5,
            declared: Some(7),
        };
        let msg = err.to_string();
        assert!(msg.contains("attached 5"));
        assert!(msg.contains("Some(7)"));
    }
}
