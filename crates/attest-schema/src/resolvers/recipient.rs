use attest_core::{Address, Attestation};

use crate::resolver::Resolver;

/// Accepts attestations only when the recipient is a fixed target.
///
/// Attestations with no recipient are rejected.
#[derive(Debug, Clone)]
pub struct RecipientResolver {
    address: Address,
    target: Address,
}

impl RecipientResolver {
    /// A resolver at `address` admitting only `target` as recipient.
    pub fn new(address: Address, target: Address) -> Self {
        Self { address, target }
    }

    /// The only admitted recipient.
    pub fn target(&self) -> Address {
        self.target
    }
}

impl Resolver for RecipientResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn on_attest(&self, attestation: &Attestation, _value: u64) -> bool {
        attestation.recipient == Some(self.target)
    }

    fn on_revoke(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }
}
