use attest_core::{Address, Attestation};

use crate::resolver::Resolver;

/// Accepts attestations whose payload is one of a fixed set of byte
/// strings.
#[derive(Debug, Clone)]
pub struct DataResolver {
    address: Address,
    allowed: Vec<Vec<u8>>,
}

impl DataResolver {
    /// A resolver at `address` admitting only the single-byte payloads
    /// `0x00` and `0x01`.
    pub fn boolean(address: Address) -> Self {
        Self::new(address, vec![vec![0x00], vec![0x01]])
    }

    /// A resolver at `address` admitting only payloads in `allowed`.
    pub fn new(address: Address, allowed: Vec<Vec<u8>>) -> Self {
        Self { address, allowed }
    }
}

impl Resolver for DataResolver {
    fn address(&self) -> Address {
        self.address
    }

    fn on_attest(&self, attestation: &Attestation, _value: u64) -> bool {
        self.allowed.iter().any(|d| *d == attestation.data)
    }

    fn on_revoke(&self, _attestation: &Attestation, _value: u64) -> bool {
        true
    }
}
