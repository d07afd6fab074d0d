//! Property: every committed attestation gets a distinct uid, even for
//! byte-identical requests submitted in the same second.

use std::collections::HashSet;
use std::sync::Arc;

use attest_core::{Address, AttestationRequest, CallContext, ManualClock, Timestamp};
use attest_state::{AttestationEngine, EngineConfig};
use proptest::prelude::*;

proptest! {
    #[test]
    fn uids_never_collide(
        payloads in prop::collection::vec(prop::collection::vec(0u8..4, 0..3), 1..24),
        batch_split in 1usize..8,
    ) {
        let clock = ManualClock::new(Timestamp::from_epoch_secs(1_700_000_000).unwrap());
        let mut engine = AttestationEngine::with_clock(EngineConfig::default(), Arc::new(clock));
        let schema = engine.register_schema("bytes data", None, true).unwrap();
        let ctx = CallContext::new(Address([1; 20]));

        let mut seen = HashSet::new();
        for chunk in payloads.chunks(batch_split) {
            let requests = chunk
                .iter()
                .map(|d| AttestationRequest::new(schema).data(d.clone()))
                .collect();
            for uid in engine.attest_batch(&ctx, requests).unwrap() {
                prop_assert!(seen.insert(uid));
            }
        }
        prop_assert_eq!(engine.attestation_count(), payloads.len());
    }
}
