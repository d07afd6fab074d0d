//! # Attestation Records and Requests
//!
//! [`Attestation`] is the ledger record. [`AttestationRequest`] and
//! [`RevocationRequest`] are what callers submit; [`CallContext`] carries the
//! submitter identity and the value attached to the call.
//!
//! ## Lifecycle
//!
//! ```text
//! attest() ──▶ Active ──revoke()──▶ Revoked (terminal)
//!                │
//!                └── expiration_time < now ──▶ Expired (derived view only)
//! ```
//!
//! `Expired` is never stored. An expired record is still `Active` in the
//! ledger but fails every validity check.

use serde::{Deserialize, Serialize};

use crate::identity::{Address, SchemaId, Uid};
use crate::temporal::Timestamp;

/// Identity and attached value of the party making a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Submitter of the call (relayer, for delegated calls).
    pub sender: Address,
    /// Total value attached to the call.
    pub value: u64,
}

impl CallContext {
    /// A call carrying no value.
    pub fn new(sender: Address) -> Self {
        Self { sender, value: 0 }
    }

    /// Attach `value` to the call.
    pub fn with_value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}

/// A persisted attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Unique handle.
    pub uid: Uid,
    /// Schema the attestation was made under.
    pub schema: SchemaId,
    /// Party that made the claim (the signer, for delegated attestations).
    pub attester: Address,
    /// Subject of the claim, if any.
    pub recipient: Option<Address>,
    /// Creation time.
    pub time: Timestamp,
    /// `None` means the attestation never expires.
    pub expiration_time: Option<Timestamp>,
    /// `None` until a revocation succeeds. Immutable afterwards.
    pub revocation_time: Option<Timestamp>,
    /// Optional link to another attestation.
    pub ref_uid: Option<Uid>,
    /// Copied from the schema at creation.
    pub revocable: bool,
    /// Opaque payload; only the resolver interprets it.
    #[serde(with = "crate::hex::serde_bytes")]
    pub data: Vec<u8>,
    /// Value forwarded to the resolver when the attestation was made.
    pub value: u64,
}

impl Attestation {
    /// Whether a revocation has been recorded.
    pub fn is_revoked(&self) -> bool {
        self.revocation_time.is_some()
    }

    /// Whether the attestation has expired as of `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        matches!(self.expiration_time, Some(exp) if exp < now)
    }

    /// Derived lifecycle status as of `now`. Revocation wins over expiry.
    pub fn status_at(&self, now: Timestamp) -> AttestationStatus {
        if self.is_revoked() {
            AttestationStatus::Revoked
        } else if self.is_expired_at(now) {
            AttestationStatus::Expired
        } else {
            AttestationStatus::Active
        }
    }
}

/// Read-time view of an attestation's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttestationStatus {
    /// Not revoked and not expired.
    Active,
    /// Past its expiration time. Stored state is still active.
    Expired,
    /// Revoked (terminal).
    Revoked,
}

impl std::fmt::Display for AttestationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Active => "ACTIVE",
            Self::Expired => "EXPIRED",
            Self::Revoked => "REVOKED",
        })
    }
}

/// A request to create an attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttestationRequest {
    /// Target schema.
    pub schema: SchemaId,
    /// Subject of the claim.
    #[serde(default)]
    pub recipient: Option<Address>,
    /// Must be in the future when set.
    #[serde(default)]
    pub expiration_time: Option<Timestamp>,
    /// Must name an existing, unexpired attestation when set.
    #[serde(default)]
    pub ref_uid: Option<Uid>,
    /// Opaque payload.
    #[serde(default, with = "crate::hex::serde_bytes")]
    pub data: Vec<u8>,
    /// Value to forward to the schema's resolver.
    #[serde(default)]
    pub value: u64,
}

impl AttestationRequest {
    /// A request with no recipient, no expiry, no reference, empty data and
    /// zero value.
    pub fn new(schema: SchemaId) -> Self {
        Self {
            schema,
            recipient: None,
            expiration_time: None,
            ref_uid: None,
            data: Vec::new(),
            value: 0,
        }
    }

    /// Set the recipient.
    pub fn recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Set the expiration time.
    pub fn expiration_time(mut self, at: Timestamp) -> Self {
        self.expiration_time = Some(at);
        self
    }

    /// Reference another attestation.
    pub fn ref_uid(mut self, uid: Uid) -> Self {
        self.ref_uid = Some(uid);
        self
    }

    /// Set the payload.
    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the value forwarded to the resolver.
    pub fn value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}

/// A request to revoke an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevocationRequest {
    /// Attestation to revoke.
    pub uid: Uid,
    /// Value to forward to the schema's resolver.
    #[serde(default)]
    pub value: u64,
}

impl RevocationRequest {
    /// Revoke `uid` with no value attached.
    pub fn new(uid: Uid) -> Self {
        Self { uid, value: 0 }
    }

    /// Set the value forwarded to the resolver.
    pub fn value(mut self, value: u64) -> Self {
        self.value = value;
        self
    }
}
