use attest_core::{Address, Attestation};

use crate::resolver::Resolver;

/// Accepts everything; refuses value.
#[derive(Debug, Clone)]
pub struct NoopResolver {
    address: Address,
}

impl NoopResolver {
    /// A no-op resolver at `address`.
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

impl Resolver for NoopResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn on_attest(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }

    fn on_revoke(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }
}

/// Accepts everything, including any forwarded value.
#[derive(Debug, Clone)]
pub struct PayableResolver {
    address: Address,
}

impl PayableResolver {
    /// A payable no-op resolver at `address`.
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

impl Resolver for PayableResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn is_payable(&self) -> bool {
        true
    }

    fn on_attest(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }

    fn on_revoke(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }
}
