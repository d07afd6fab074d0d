use attest_core::{Address, Attestation};

use crate::resolver::Resolver;

/// Accepts attestations only from a fixed attester.
#[derive(Debug, Clone)]
pub struct AttesterResolver {
    address: Address,
    target: Address,
}

impl AttesterResolver {
    /// A resolver at `address` admitting only `target` as attester.
    pub fn new(address: Address, target: Address) -> Self {
        Self { address, target }
    }
}

impl Resolver for AttesterResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn on_attest(&self, attestation: &Attestation, _value: u64) -> bool {
        attestation.attester == self.target
    }

    fn on_revoke(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::fixtures::record;

    #[test]
    fn admits_only_the_target_attester() {
        let resolver = AttesterResolver::new(Address([0xee; 20]), Address([3; 20]));
        let mut rec = record();
        assert!(resolver.on_attest(&rec, 0));
        rec.attester = Address([9; 20]);
        assert!(!resolver.on_attest(&rec, 0));
        assert!(resolver.on_revoke(&rec, 0));
    }
}
