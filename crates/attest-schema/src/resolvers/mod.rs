//! # Stock Resolvers
//!
//! Each resolver is pure policy over the record and the forwarded value.
//! None of them knows about the engine, and the engine never branches on
//! which one is bound.
//!
//! | resolver | attest | revoke | payable |
//! |---|---|---|---|
//! | [`RecipientResolver`] | recipient == target | always | no |
//! | [`AttesterResolver`] | attester == target | always | no |
//! | [`ValueResolver`] | value == target | value == 0 | yes |
//! | [`MinimumValueResolver`] | value >= threshold | always | yes |
//! | [`DataResolver`] | data in allowed set | always | no |
//! | [`ExpirationTimeResolver`] | expiration >= threshold | always | no |
//! | [`RevocationResolver`] | always | toggle | no |
//! | [`CompositeResolver`] | all / any children | all / any children | all children |
//! | [`NoopResolver`] | always | always | no |
//! | [`PayableResolver`] | always | always | yes |

mod attester;
mod composite;
mod data;
mod expiration;
mod noop;
mod recipient;
mod revocation;
mod value;

pub use attester::AttesterResolver;
pub use composite::{CompositeMode, CompositeResolver};
pub use data::DataResolver;
pub use expiration::ExpirationTimeResolver;
pub use noop::{NoopResolver, PayableResolver};
pub use recipient::RecipientResolver;
pub use revocation::RevocationResolver;
pub use value::{MinimumValueResolver, ValueResolver};

#[cfg(test)]
pub(crate) mod fixtures {
    use attest_core::{Address, Attestation, SchemaId, Timestamp, Uid};

    pub fn record() -> Attestation {
        Attestation {
            uid: Uid([1; 32]),
            schema: SchemaId([2; 32]),
            attester: Address([3; 20]),
            recipient: Some(Address([4; 20])),
            time: Timestamp::parse("2026-01-01T00:00:00Z").unwrap(),
            expiration_time: None,
            revocation_time: None,
            ref_uid: None,
            revocable: true,
            data: vec![0x12, 0x34],
            value: 0,
        }
    }
}
