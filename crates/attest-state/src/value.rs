//! # Value Ledger
//!
//! Running totals of value forwarded to resolvers. The engine never keeps
//! value for itself: every unit attached to a committed call is credited to
//! exactly one resolver address, and nothing is credited for a call that
//! fails.

use std::collections::BTreeMap;

use attest_core::Address;

/// Per-resolver forwarded value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValueLedger {
    balances: BTreeMap<Address, u64>,
}

impl ValueLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total credited to `resolver`.
    pub fn balance(&self, resolver: &Address) -> u64 {
        self.balances.get(resolver).copied().unwrap_or(0)
    }

    /// Total credited across all resolvers.
    pub fn total(&self) -> u64 {
        self.balances.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Apply committed credits.
    pub(crate) fn credit_all(&mut self, credits: impl IntoIterator<Item = (Address, u64)>) {
        for (resolver, amount) in credits {
            let balance = self.balances.entry(resolver).or_insert(0);
            *balance = balance.saturating_add(amount);
        }
    }

    /// Iterate balances in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.balances.iter()
    }
}

/// Sum of per-item values, `None` on overflow.
pub fn declared_total(values: impl IntoIterator<Item = u64>) -> Option<u64> {
    values.into_iter().try_fold(0u64, |acc, v| acc.checked_add(v))
}
