//! # Resolver Contract
//!
//! A resolver is a pluggable admission policy bound to a schema at
//! registration. The engine calls [`Resolver::on_attest`] before persisting
//! an attestation and [`Resolver::on_revoke`] before recording a
//! revocation. A `false` return vetoes the operation.
//!
//! ## Invariants
//!
//! - Hooks take `&self` and a borrowed record. A resolver has no handle on
//!   the engine, so it cannot re-enter it or observe staged state.
//! - The engine never calls a hook with non-zero value on a resolver whose
//!   [`Resolver::is_payable`] is `false`.
//! - Value handed to a hook is only credited to [`Resolver::address`] after
//!   the whole operation commits.

use std::sync::Arc;

use attest_core::{Address, Attestation};
use serde::{Serialize, Serializer};

/// Admission policy for attestations and revocations under one schema.
pub trait Resolver: Send + Sync + std::fmt::Debug {
    /// Identity that receives forwarded value. Part of the schema id.
    fn address(&self) -> Address;

    /// Whether this resolver accepts forwarded value.
    fn is_payable(&self) -> bool {
        false
    }

    /// Decide whether `attestation` may be persisted.
    fn on_attest(&self, attestation: &Attestation, value: u64) -> bool;

    /// Decide whether `attestation` may be revoked.
    fn on_revoke(&self, attestation: &Attestation, value: u64) -> bool;
}

/// Shared reference to a bound resolver.
///
/// Equality and serialization go through the resolver's address.
#[derive(Clone)]
pub struct ResolverHandle(Arc<dyn Resolver>);

impl ResolverHandle {
    /// Wrap a resolver.
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self(resolver)
    }

    /// The resolver's address.
    pub fn address(&self) -> Address {
        self.0.address()
    }

    /// Borrow the resolver.
    pub fn resolver(&self) -> &dyn Resolver {
        self.0.as_ref()
    }
}

impl From<Arc<dyn Resolver>> for ResolverHandle {
    fn from(resolver: Arc<dyn Resolver>) -> Self {
        Self(resolver)
    }
}

impl PartialEq for ResolverHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for ResolverHandle {}

impl std::fmt::Debug for ResolverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResolverHandle({:?})", self.0)
    }
}

impl Serialize for ResolverHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.address().serialize(serializer)
    }
}
