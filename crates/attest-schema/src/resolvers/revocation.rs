use std::sync::atomic::{AtomicBool, Ordering};

use attest_core::{Address, Attestation};

use crate::resolver::Resolver;

/// Accepts every attestation; revocations are accepted only while the
/// toggle is on.
#[derive(Debug)]
pub struct RevocationResolver {
    address: Address,
    allow_revocation: AtomicBool,
}

impl RevocationResolver {
    /// A resolver at `address` with revocations initially allowed or not.
    pub fn new(address: Address, allow_revocation: bool) -> Self {
        Self {
            address,
            allow_revocation: AtomicBool::new(allow_revocation),
        }
    }

    /// Turn revocation acceptance on or off.
    pub fn set_revocation(&self, allow: bool) {
        self.allow_revocation.store(allow, Ordering::SeqCst);
    }
}

impl Resolver for RevocationResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn on_attest(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }

    fn on_revoke(&self, _attestation: &Attestation, _value: u64) -> bool {
        self.allow_revocation.load(Ordering::SeqCst)
    }
}
