use attest_core::{Address, Attestation};

use crate::resolver::Resolver;

/// Requires an exact forwarded value on attest; revocations must carry
/// none.
#[derive(Debug, Clone)]
pub struct ValueResolver {
    address: Address,
    target_value: u64,
}

impl ValueResolver {
    /// A resolver at `address` requiring exactly `target_value`.
    pub fn new(address: Address, target_value: u64) -> Self {
        Self {
            address,
            target_value,
        }
    }
}

impl Resolver for ValueResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn is_payable(&self) -> bool {
        true
    }

    fn on_attest(&self, _attestation: &Attestation, value: u64) -> bool {
        value == self.target_value
    }

    fn on_revoke(&self, _attestation: &Attestation, value: u64) -> bool {
        value == 0
    }
}

/// Requires the forwarded value to meet a threshold on attest.
#[derive(Debug, Clone)]
pub struct MinimumValueResolver {
    address: Address,
    threshold: u64,
}

impl MinimumValueResolver {
    /// A resolver at `address` requiring at least `threshold`.
    pub fn new(address: Address, threshold: u64) -> Self {
        Self { address, threshold }
    }
}

impl Resolver for MinimumValueResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn is_payable(&self) -> bool {
        true
    }

    fn on_attest(&self, _attestation: &Attestation, value: u64) -> bool {
        value >= self.threshold
    }

    fn on_revoke(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }
}
