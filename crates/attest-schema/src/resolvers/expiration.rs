use attest_core::{Address, Attestation, Timestamp};

use crate::resolver::Resolver;

/// Accepts attestations that expire no earlier than a threshold.
///
/// Attestations without an expiration are rejected.
#[derive(Debug, Clone)]
pub struct ExpirationTimeResolver {
    address: Address,
    threshold: Timestamp,
}

impl ExpirationTimeResolver {
    /// A resolver at `address` requiring `expiration_time >= threshold`.
    pub fn new(address: Address, threshold: Timestamp) -> Self {
        Self { address, threshold }
    }
}

impl Resolver for ExpirationTimeResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn on_attest(&self, attestation: &Attestation, _value: u64) -> bool {
        matches!(attestation.expiration_time, Some(exp) if exp >= self.threshold)
    }

    fn on_revoke(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }
}
