//! # Delegated Attestation and Revocation
//!
//! A relayer submits on a signer's behalf. The signer is recorded as
//! attester, signatures are bound to the engine's domain, and each nonce is
//! usable exactly once and only after a successful call.

use std::sync::Arc;

use attest_core::{Address, AttestationRequest, CallContext, ManualClock, RevocationRequest, SchemaId, Timestamp, Uid};
use attest_crypto::{Ed25519KeyPair, Ed25519Signature};
use attest_schema::resolvers::RecipientResolver;
use attest_schema::Resolver;
use attest_state::{sign_attestation, sign_revocation, AttestError, AttestationEngine, EngineConfig};

const START: i64 = 1_700_000_000;
const RELAYER: Address = Address([0x7e; 20]);
const TARGET: Address = Address([0x05; 20]);

struct Fixture {
    engine: AttestationEngine,
    clock: ManualClock,
    schema: SchemaId,
    signer: Ed25519KeyPair,
}

fn fixture() -> Fixture {
    let clock = ManualClock::new(Timestamp::from_epoch_secs(START).unwrap());
    let mut engine = AttestationEngine::with_clock(EngineConfig::default(), Arc::new(clock.clone()));
    let resolver: Arc<dyn Resolver> = Arc::new(RecipientResolver::new(Address([0x5e; 20]), TARGET));
    let schema = engine.register_schema("bytes32 eventId", Some(resolver), true).unwrap();
    Fixture {
        engine,
        clock,
        schema,
        signer: Ed25519KeyPair::from_seed(&[0x42; 32]),
    }
}

fn deadline(offset: i64) -> Timestamp {
    Timestamp::from_epoch_secs(START + offset).unwrap()
}

#[test]
fn signer_becomes_attester_and_nonce_advances() {
    let mut f = fixture();
    let signed = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        true,
        0,
        deadline(60),
    )
    .unwrap();

    let uid = f.engine.attest_delegated(&CallContext::new(RELAYER), &signed).unwrap();
    let record = f.engine.get_attestation(&uid).unwrap();
    assert_eq!(record.attester, f.signer.address());
    assert_ne!(record.attester, RELAYER);
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 1);
}

#[test]
fn replay_is_invalid_nonce() {
    let mut f = fixture();
    let signed = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    let ctx = CallContext::new(RELAYER);
    f.engine.attest_delegated(&ctx, &signed).unwrap();
    assert!(matches!(
        f.engine.attest_delegated(&ctx, &signed),
        Err(AttestError::InvalidNonce { expected: 1, got: 0, .. })
    ));
    assert_eq!(f.engine.attestation_count(), 1);
}

#[test]
fn tampered_signature_is_rejected() {
    let mut f = fixture();
    let mut signed = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    let mut bytes = signed.signature.signature.0;
    bytes[0] ^= 0xff;
    signed.signature.signature = Ed25519Signature(bytes);

    assert!(matches!(
        f.engine.attest_delegated(&CallContext::new(RELAYER), &signed),
        Err(AttestError::InvalidSignature(_))
    ));
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 0);
}

#[test]
fn expired_deadline_is_rejected() {
    let mut f = fixture();
    let signed = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    f.clock.advance(61);
    assert!(matches!(
        f.engine.attest_delegated(&CallContext::new(RELAYER), &signed),
        Err(AttestError::ExpiredSignature { .. })
    ));
}

#[test]
fn signature_for_another_schema_flag_is_rejected() {
    let mut f = fixture();
    // The schema is revocable; a signature claiming otherwise must not verify.
    let signed = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        false,
        0,
        deadline(60),
    )
    .unwrap();
    assert!(matches!(
        f.engine.attest_delegated(&CallContext::new(RELAYER), &signed),
        Err(AttestError::InvalidSignature(_))
    ));
}

#[test]
fn failed_inner_attestation_does_not_consume_nonce() {
    let mut f = fixture();
    let ctx = CallContext::new(RELAYER);
    let rejected = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(Address([0x01; 20])),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    assert!(matches!(
        f.engine.attest_delegated(&ctx, &rejected),
        Err(AttestError::InvalidAttestation(_))
    ));
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 0);

    // The same nonce is still usable for a valid request.
    let accepted = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    f.engine.attest_delegated(&ctx, &accepted).unwrap();
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 1);
}

#[test]
fn unknown_schema_is_schema_not_found() {
    let mut f = fixture();
    let signed = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(SchemaId([0x99; 32])),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    assert!(matches!(
        f.engine.attest_delegated(&CallContext::new(RELAYER), &signed),
        Err(AttestError::SchemaNotFound(_))
    ));
}

#[test]
fn delegated_revocation_requires_signer_to_be_attester() {
    let mut f = fixture();
    let relayer = CallContext::new(RELAYER);
    let signed = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    let uid = f.engine.attest_delegated(&relayer, &signed).unwrap();

    // The relayer cannot revoke directly.
    assert!(matches!(
        f.engine.revoke(&relayer, RevocationRequest::new(uid)),
        Err(AttestError::Unauthorized { .. })
    ));

    let stranger = Ed25519KeyPair::from_seed(&[0x43; 32]);
    let foreign = sign_revocation(&stranger, f.engine.domain(), f.schema, RevocationRequest::new(uid), 0, deadline(60)).unwrap();
    assert!(matches!(
        f.engine.revoke_delegated(&relayer, &foreign),
        Err(AttestError::Unauthorized { .. })
    ));
    assert_eq!(f.engine.nonce_of(&stranger.address()), 0);

    let revocation = sign_revocation(&f.signer, f.engine.domain(), f.schema, RevocationRequest::new(uid), 1, deadline(60)).unwrap();
    f.engine.revoke_delegated(&relayer, &revocation).unwrap();
    assert!(!f.engine.is_valid(&uid, None));
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 2);
}

#[test]
fn signature_from_another_engine_is_rejected() {
    let mut f = fixture();
    let mut other_config = EngineConfig::default();
    other_config.engine_id = "other-engine".to_string();
    let other = AttestationEngine::new(other_config);
    let signed = sign_attestation(
        &f.signer,
        other.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    assert!(matches!(
        f.engine.attest_delegated(&CallContext::new(RELAYER), &signed),
        Err(AttestError::InvalidSignature(_))
    ));
}

fn delegated_attestation(f: &mut Fixture) -> Uid {
    let signed = sign_attestation(
        &f.signer,
        f.engine.domain(),
        AttestationRequest::new(f.schema).recipient(TARGET),
        true,
        0,
        deadline(60),
    )
    .unwrap();
    f.engine.attest_delegated(&CallContext::new(RELAYER), &signed).unwrap()
}

#[test]
fn revocation_replay_is_invalid_nonce() {
    let mut f = fixture();
    let uid = delegated_attestation(&mut f);
    let revocation = sign_revocation(&f.signer, f.engine.domain(), f.schema, RevocationRequest::new(uid), 1, deadline(60)).unwrap();
    let ctx = CallContext::new(RELAYER);
    f.engine.revoke_delegated(&ctx, &revocation).unwrap();

    assert!(matches!(
        f.engine.revoke_delegated(&ctx, &revocation),
        Err(AttestError::InvalidNonce { expected: 2, got: 1, .. })
    ));
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 2);
}

#[test]
fn tampered_revocation_signature_is_rejected() {
    let mut f = fixture();
    let uid = delegated_attestation(&mut f);
    let mut revocation =
        sign_revocation(&f.signer, f.engine.domain(), f.schema, RevocationRequest::new(uid), 1, deadline(60)).unwrap();
    let mut bytes = revocation.signature.signature.0;
    bytes[0] ^= 0xff;
    revocation.signature.signature = Ed25519Signature(bytes);

    assert!(matches!(
        f.engine.revoke_delegated(&CallContext::new(RELAYER), &revocation),
        Err(AttestError::InvalidSignature(_))
    ));
    assert!(f.engine.is_valid(&uid, None));
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 1);
}

#[test]
fn expired_revocation_deadline_is_rejected() {
    let mut f = fixture();
    let uid = delegated_attestation(&mut f);
    let revocation = sign_revocation(&f.signer, f.engine.domain(), f.schema, RevocationRequest::new(uid), 1, deadline(30)).unwrap();
    f.clock.advance(31);

    assert!(matches!(
        f.engine.revoke_delegated(&CallContext::new(RELAYER), &revocation),
        Err(AttestError::ExpiredSignature { .. })
    ));
    assert!(f.engine.is_valid(&uid, None));
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 1);
}

#[test]
fn revocation_signed_for_another_schema_is_rejected() {
    let mut f = fixture();
    let uid = delegated_attestation(&mut f);
    let other_schema = f.engine.register_schema("bool other", None, true).unwrap();
    let revocation =
        sign_revocation(&f.signer, f.engine.domain(), other_schema, RevocationRequest::new(uid), 1, deadline(60)).unwrap();

    assert!(matches!(
        f.engine.revoke_delegated(&CallContext::new(RELAYER), &revocation),
        Err(AttestError::InvalidSignature(_))
    ));
    assert!(f.engine.is_valid(&uid, None));
}

#[test]
fn revocation_of_unknown_uid_is_not_found() {
    let mut f = fixture();
    let unknown = Uid([0x99; 32]);
    let revocation =
        sign_revocation(&f.signer, f.engine.domain(), f.schema, RevocationRequest::new(unknown), 0, deadline(60)).unwrap();

    assert!(matches!(
        f.engine.revoke_delegated(&CallContext::new(RELAYER), &revocation),
        Err(AttestError::NotFound(uid)) if uid == unknown
    ));
    assert_eq!(f.engine.nonce_of(&f.signer.address()), 0);
}
