//! # Attestation Ledger
//!
//! The committed record store plus the [`Staging`] buffer a batch is
//! validated against.
//!
//! ## Uid derivation
//!
//! ```text
//! Uid = SHA-256( JCS{ schema, attester, recipient, time, expiration_time,
//!                     revocable, ref_uid, data, bump } )
//! ```
//!
//! `bump` starts at the ledger's record sequence plus the number of records
//! already staged, and is incremented until the uid is unused. Two identical
//! requests in the same second therefore still receive distinct uids.
//!
//! ## Staging
//!
//! A batch stages every record and revocation before anything is committed.
//! Lookups see committed state overlaid with staged state, so a later item
//! may reference an earlier item's uid, and a uid revoked twice in one batch
//! is caught. Dropping a `Staging` discards everything in it.

use std::collections::{BTreeMap, HashMap};

use attest_core::{
    hex, sha256_digest, Address, Attestation, CanonicalBytes, CanonicalizationError, SchemaId,
    Timestamp, Uid,
};
use serde::Serialize;

#[derive(Serialize)]
struct UidPreimage {
    schema: SchemaId,
    attester: Address,
    recipient: Option<Address>,
    time: Timestamp,
    expiration_time: Option<Timestamp>,
    revocable: bool,
    ref_uid: Option<Uid>,
    data: String,
    bump: u64,
}

/// Derive the uid of `record` for a given `bump`. The record's own `uid`,
/// `revocation_time` and `value` fields are not part of the preimage.
pub fn derive_uid(record: &Attestation, bump: u64) -> Result<Uid, CanonicalizationError> {
    let preimage = UidPreimage {
        schema: record.schema,
        attester: record.attester,
        recipient: record.recipient,
        time: record.time,
        expiration_time: record.expiration_time,
        revocable: record.revocable,
        ref_uid: record.ref_uid,
        data: hex::encode_prefixed(&record.data),
        bump,
    };
    Ok(sha256_digest(&CanonicalBytes::new(&preimage)?).into())
}

/// Committed attestations.
#[derive(Debug, Default)]
pub struct AttestationLedger {
    records: HashMap<Uid, Attestation>,
    sequence: u64,
}

impl AttestationLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a committed record.
    pub fn get(&self, uid: &Uid) -> Option<&Attestation> {
        self.records.get(uid)
    }

    /// Number of committed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ever committed. Feeds the uid bump.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Iterate committed records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Attestation> {
        self.records.values()
    }

    /// Apply a fully validated staging buffer.
    pub(crate) fn commit(&mut self, staged: Vec<Attestation>, revocations: &BTreeMap<Uid, Timestamp>) {
        for record in staged {
            self.sequence += 1;
            self.records.insert(record.uid, record);
        }
        for (uid, at) in revocations {
            if let Some(record) = self.records.get_mut(uid) {
                if record.revocation_time.is_none() {
                    record.revocation_time = Some(*at);
                }
            }
        }
    }
}

/// Uncommitted effects of one engine call.
#[derive(Debug, Default)]
pub struct Staging {
    records: Vec<Attestation>,
    revocations: BTreeMap<Uid, Timestamp>,
    credits: Vec<(Address, u64)>,
}

impl Staging {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for `uid` as the batch currently sees it, with any staged
    /// revocation applied.
    pub fn lookup(&self, ledger: &AttestationLedger, uid: &Uid) -> Option<Attestation> {
        let mut record = ledger
            .get(uid)
            .or_else(|| self.records.iter().find(|r| r.uid == *uid))
            .cloned()?;
        if let Some(at) = self.revocations.get(uid) {
            record.revocation_time = Some(*at);
        }
        Some(record)
    }

    /// Whether `uid` is taken in the ledger or in this buffer.
    pub fn contains(&self, ledger: &AttestationLedger, uid: &Uid) -> bool {
        ledger.get(uid).is_some() || self.records.iter().any(|r| r.uid == *uid)
    }

    /// Mint a fresh uid for `record` against the ledger and this buffer.
    pub fn mint_uid(
        &self,
        ledger: &AttestationLedger,
        record: &Attestation,
    ) -> Result<Uid, CanonicalizationError> {
        let mut bump = ledger.sequence() + self.records.len() as u64;
        loop {
            let uid = derive_uid(record, bump)?;
            if !self.contains(ledger, &uid) {
                return Ok(uid);
            }
            bump += 1;
        }
    }

    /// Stage a new record, crediting `credit` on commit.
    pub fn stage_record(&mut self, record: Attestation, credit: Option<(Address, u64)>) {
        self.records.push(record);
        self.credits.extend(credit);
    }

    /// Stage a revocation, crediting `credit` on commit.
    pub fn stage_revocation(&mut self, uid: Uid, at: Timestamp, credit: Option<(Address, u64)>) {
        self.revocations.insert(uid, at);
        self.credits.extend(credit);
    }

    /// Uids of staged records, in staging order.
    pub fn staged_uids(&self) -> Vec<Uid> {
        self.records.iter().map(|r| r.uid).collect()
    }

    /// Number of staged records and revocations.
    pub fn len(&self) -> usize {
        self.records.len() + self.revocations.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Vec<Attestation>, BTreeMap<Uid, Timestamp>, Vec<(Address, u64)>) {
        (self.records, self.revocations, self.credits)
    }
}
