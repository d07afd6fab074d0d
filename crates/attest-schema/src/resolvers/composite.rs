use std::sync::Arc;

use attest_core::{Address, Attestation};

use crate::resolver::Resolver;

/// How a composite combines its children's verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Every child must accept.
    All,
    /// At least one child must accept.
    Any,
}

/// Combines several resolvers under one address.
///
/// Payable only when every child is payable, so a child that refuses value
/// is never handed any. Children see the full forwarded value; the credit
/// goes to the composite's own address.
#[derive(Debug, Clone)]
pub struct CompositeResolver {
    address: Address,
    mode: CompositeMode,
    children: Vec<Arc<dyn Resolver>>,
}

impl CompositeResolver {
    /// A composite at `address` requiring every child to accept.
    pub fn all(address: Address, children: Vec<Arc<dyn Resolver>>) -> Self {
        Self {
            address,
            mode: CompositeMode::All,
            children,
        }
    }

    /// A composite at `address` requiring at least one child to accept.
    ///
    /// An empty `Any` composite rejects everything.
    pub fn any(address: Address, children: Vec<Arc<dyn Resolver>>) -> Self {
        Self {
            address,
            mode: CompositeMode::Any,
            children,
        }
    }

    /// The combination mode.
    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    fn combine(&self, verdict: impl Fn(&dyn Resolver) -> bool) -> bool {
        match self.mode {
            CompositeMode::All => self.children.iter().all(|c| verdict(c.as_ref())),
            CompositeMode::Any => self.children.iter().any(|c| verdict(c.as_ref())),
        }
    }
}

impl Resolver for CompositeResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn is_payable(&self) -> bool {
        self.children.iter().all(|c| c.is_payable())
    }

    fn on_attest(&self, attestation: &Attestation, value: u64) -> bool {
        self.combine(|c| c.on_attest(attestation, value))
    }

    fn on_revoke(&self, attestation: &Attestation, value: u64) -> bool {
        self.combine(|c| c.on_revoke(attestation, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::fixtures::record;
    use crate::resolvers::{AttesterResolver, MinimumValueResolver, PayableResolver, RecipientResolver};

    fn recipient_and_attester() -> Vec<Arc<dyn Resolver>> {
        vec![
            Arc::new(RecipientResolver::new(Address([0xa0; 20]), Address([4; 20]))),
            Arc::new(AttesterResolver::new(Address([0xa1; 20]), Address([3; 20]))),
        ]
    }

    #[test]
    fn all_requires_every_child() {
        let composite = CompositeResolver::all(Address([0xee; 20]), recipient_and_attester());
        let mut rec = record();
        assert!(composite.on_attest(&rec, 0));
        rec.attester = Address([9; 20]);
        assert!(!composite.on_attest(&rec, 0));
    }

    #[test]
    fn any_requires_one_child() {
        let composite = CompositeResolver::any(Address([0xee; 20]), recipient_and_attester());
        let mut rec = record();
        rec.attester = Address([9; 20]);
        assert!(composite.on_attest(&rec, 0));
        rec.recipient = None;
        assert!(!composite.on_attest(&rec, 0));
    }

    #[test]
    fn payable_only_if_all_children_are() {
        let unpayable = CompositeResolver::all(Address([0xee; 20]), recipient_and_attester());
        assert!(!unpayable.is_payable());

        let payable = CompositeResolver::all(
            Address([0xef; 20]),
            vec![
                Arc::new(PayableResolver::new(Address([0xa2; 20]))),
                Arc::new(MinimumValueResolver::new(Address([0xa3; 20]), 10)),
            ],
        );
        assert!(payable.is_payable());
        assert!(payable.on_attest(&record(), 10));
        assert!(!payable.on_attest(&record(), 9));
    }

    #[test]
    fn empty_any_rejects() {
        let composite = CompositeResolver::any(Address([0xee; 20]), Vec::new());
        assert!(!composite.on_attest(&record(), 0));
        assert_eq!(composite.mode(), CompositeMode::Any);
    }
}
