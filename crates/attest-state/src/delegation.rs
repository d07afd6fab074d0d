//! # Delegated Submission
//!
//! A signer authorizes an attestation or revocation off-line; any relayer
//! may then submit it. The engine records the signer, not the relayer, as
//! the attester or revoker.
//!
//! ## Signed message
//!
//! The signer signs the JCS canonical form of:
//!
//! ```json
//! {
//!   "domain":   { "name": "attest", "version": "1", "engine_id": "attest-local" },
//!   "kind":     "attest",
//!   "schema":   "0x…", "recipient": "0x…" | null,
//!   "expiration_time": "…Z" | null, "revocable": true,
//!   "ref_uid":  "0x…" | null, "data": "0x…", "value": 0,
//!   "nonce":    0, "deadline": "…Z"
//! }
//! ```
//!
//! A revocation message has `"kind": "revoke"` and carries `schema`, `uid`
//! and `value` in place of the attestation fields. `revocable` is the
//! schema's flag as registered, and a revocation's `schema` is the one the
//! target was made under; neither is a caller choice.
//!
//! ## Checks, in order
//!
//! 1. The signature verifies under the supplied public key, and that key's
//!    address equals the claimed signer (`InvalidSignature`).
//! 2. The deadline has not passed (`ExpiredSignature`).
//! 3. The nonce equals the signer's next unused nonce (`InvalidNonce`).
//!
//! The nonce is consumed only when the whole delegated call succeeds. A
//! signed request whose inner attestation is rejected can be resubmitted.

use std::collections::HashMap;

use attest_core::{
    hex, Address, AttestationRequest, CanonicalBytes, CanonicalizationError, RevocationRequest,
    SchemaId, Timestamp, Uid,
};
use attest_crypto::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::AttestError;

/// Domain separator bound into every signed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationDomain {
    /// Protocol name.
    pub name: String,
    /// Protocol version.
    pub version: String,
    /// Engine instance.
    pub engine_id: String,
}

impl DelegationDomain {
    /// The domain an engine with `config` verifies against.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            name: config.domain_name.clone(),
            version: config.domain_version.clone(),
            engine_id: config.engine_id.clone(),
        }
    }
}

/// A signature plus the public key it verifies under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedSignature {
    /// Signer's public key.
    pub public_key: Ed25519PublicKey,
    /// Signature over the canonical message.
    pub signature: Ed25519Signature,
}

/// A signed attestation ready for relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegatedAttestation {
    /// The attestation to make.
    pub request: AttestationRequest,
    /// Claimed signer; becomes the attester.
    pub signer: Address,
    /// Signer's next unused nonce at signing time.
    pub nonce: u64,
    /// Last instant the signature is valid.
    pub deadline: Timestamp,
    /// Authorization.
    pub signature: DelegatedSignature,
}

/// A signed revocation ready for relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegatedRevocation {
    /// The revocation to perform.
    pub request: RevocationRequest,
    /// Claimed signer; must be the original attester.
    pub signer: Address,
    /// Signer's next unused nonce at signing time.
    pub nonce: u64,
    /// Last instant the signature is valid.
    pub deadline: Timestamp,
    /// Authorization.
    pub signature: DelegatedSignature,
}

#[derive(Serialize)]
struct AttestMessage<'a> {
    domain: &'a DelegationDomain,
    kind: &'static str,
    schema: SchemaId,
    recipient: Option<Address>,
    expiration_time: Option<Timestamp>,
    revocable: bool,
    ref_uid: Option<Uid>,
    data: String,
    value: u64,
    nonce: u64,
    deadline: Timestamp,
}

#[derive(Serialize)]
struct RevokeMessage<'a> {
    domain: &'a DelegationDomain,
    kind: &'static str,
    schema: SchemaId,
    uid: Uid,
    value: u64,
    nonce: u64,
    deadline: Timestamp,
}

/// Canonical bytes a signer signs to authorize `request`.
pub fn attestation_message(
    domain: &DelegationDomain,
    request: &AttestationRequest,
    revocable: bool,
    nonce: u64,
    deadline: Timestamp,
) -> Result<CanonicalBytes, CanonicalizationError> {
    CanonicalBytes::new(&AttestMessage {
        domain,
        kind: "attest",
        schema: request.schema,
        recipient: request.recipient,
        expiration_time: request.expiration_time,
        revocable,
        ref_uid: request.ref_uid,
        data: hex::encode_prefixed(&request.data),
        value: request.value,
        nonce,
        deadline,
    })
}

/// Canonical bytes a signer signs to authorize revoking `request.uid`,
/// an attestation made under `schema`.
pub fn revocation_message(
    domain: &DelegationDomain,
    schema: SchemaId,
    request: &RevocationRequest,
    nonce: u64,
    deadline: Timestamp,
) -> Result<CanonicalBytes, CanonicalizationError> {
    CanonicalBytes::new(&RevokeMessage {
        domain,
        kind: "revoke",
        schema,
        uid: request.uid,
        value: request.value,
        nonce,
        deadline,
    })
}

/// Sign an attestation request for relay. `revocable` must match the
/// target schema's registered flag or the signature will not verify.
pub fn sign_attestation(
    keypair: &Ed25519KeyPair,
    domain: &DelegationDomain,
    request: AttestationRequest,
    revocable: bool,
    nonce: u64,
    deadline: Timestamp,
) -> Result<DelegatedAttestation, CanonicalizationError> {
    let message = attestation_message(domain, &request, revocable, nonce, deadline)?;
    Ok(DelegatedAttestation {
        request,
        signer: keypair.address(),
        nonce,
        deadline,
        signature: DelegatedSignature {
            public_key: keypair.public_key(),
            signature: keypair.sign(&message),
        },
    })
}

/// Sign a revocation request for relay. `schema` must be the schema the
/// target attestation was made under or the signature will not verify.
pub fn sign_revocation(
    keypair: &Ed25519KeyPair,
    domain: &DelegationDomain,
    schema: SchemaId,
    request: RevocationRequest,
    nonce: u64,
    deadline: Timestamp,
) -> Result<DelegatedRevocation, CanonicalizationError> {
    let message = revocation_message(domain, schema, &request, nonce, deadline)?;
    Ok(DelegatedRevocation {
        request,
        signer: keypair.address(),
        nonce,
        deadline,
        signature: DelegatedSignature {
            public_key: keypair.public_key(),
            signature: keypair.sign(&message),
        },
    })
}

/// Verifies delegated signatures and tracks per-signer nonces.
#[derive(Debug)]
pub struct DelegationVerifier {
    domain: DelegationDomain,
    nonces: HashMap<Address, u64>,
}

impl DelegationVerifier {
    /// A verifier for `domain` with every nonce at zero.
    pub fn new(domain: DelegationDomain) -> Self {
        Self {
            domain,
            nonces: HashMap::new(),
        }
    }

    /// The bound domain.
    pub fn domain(&self) -> &DelegationDomain {
        &self.domain
    }

    /// `signer`'s next unused nonce.
    pub fn nonce_of(&self, signer: &Address) -> u64 {
        self.nonces.get(signer).copied().unwrap_or(0)
    }

    /// Run the signature, deadline and nonce checks without consuming the
    /// nonce.
    pub fn verify(
        &self,
        message: &CanonicalBytes,
        signature: &DelegatedSignature,
        signer: &Address,
        nonce: u64,
        deadline: Timestamp,
        now: Timestamp,
    ) -> Result<(), AttestError> {
        verify(message, &signature.signature, &signature.public_key)
            .map_err(|e| AttestError::InvalidSignature(e.to_string()))?;
        let recovered = signature.public_key.address();
        if recovered != *signer {
            return Err(AttestError::InvalidSignature(format!(
                "signature is from {recovered}, not {signer}"
            )));
        }

        if now > deadline {
            return Err(AttestError::ExpiredSignature { deadline, now });
        }

        let expected = self.nonce_of(signer);
        if nonce != expected {
            return Err(AttestError::InvalidNonce {
                signer: *signer,
                expected,
                got: nonce,
            });
        }
        Ok(())
    }

    /// Mark `nonce` used. Only called after the delegated call committed.
    pub(crate) fn consume(&mut self, signer: Address, nonce: u64) {
        self.nonces.insert(signer, nonce.saturating_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs).unwrap()
    }

    fn domain() -> DelegationDomain {
        DelegationDomain::from_config(&EngineConfig::default())
    }

    fn request() -> AttestationRequest {
        AttestationRequest::new(SchemaId([1; 32]))
            .recipient(Address([2; 20]))
            .data(vec![0xab])
    }

    fn check(
        verifier: &DelegationVerifier,
        signed: &DelegatedAttestation,
        revocable: bool,
        now: Timestamp,
    ) -> Result<(), AttestError> {
        let message = attestation_message(
            verifier.domain(),
            &signed.request,
            revocable,
            signed.nonce,
            signed.deadline,
        )
        .unwrap();
        verifier.verify(&message, &signed.signature, &signed.signer, signed.nonce, signed.deadline, now)
    }

    #[test]
    fn valid_signature_passes() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let verifier = DelegationVerifier::new(domain());
        let signed = sign_attestation(&kp, &domain(), request(), true, 0, ts(100)).unwrap();
        check(&verifier, &signed, true, ts(50)).unwrap();
        assert_eq!(signed.signer, kp.address());
    }

    #[test]
    fn tampered_request_is_invalid_signature() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let verifier = DelegationVerifier::new(domain());
        let mut signed = sign_attestation(&kp, &domain(), request(), true, 0, ts(100)).unwrap();
        signed.request.data = vec![0xac];
        assert!(matches!(
            check(&verifier, &signed, true, ts(50)),
            Err(AttestError::InvalidSignature(_))
        ));
    }

    #[test]
    fn revocable_flag_is_bound() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let verifier = DelegationVerifier::new(domain());
        let signed = sign_attestation(&kp, &domain(), request(), false, 0, ts(100)).unwrap();
        assert!(matches!(
            check(&verifier, &signed, true, ts(50)),
            Err(AttestError::InvalidSignature(_))
        ));
    }

    #[test]
    fn foreign_domain_is_invalid_signature() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let mut other = domain();
        other.engine_id = "elsewhere".to_string();
        let verifier = DelegationVerifier::new(domain());
        let signed = sign_attestation(&kp, &other, request(), true, 0, ts(100)).unwrap();
        assert!(matches!(
            check(&verifier, &signed, true, ts(50)),
            Err(AttestError::InvalidSignature(_))
        ));
    }

    #[test]
    fn claimed_signer_must_own_the_key() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let verifier = DelegationVerifier::new(domain());
        let mut signed = sign_attestation(&kp, &domain(), request(), true, 0, ts(100)).unwrap();
        signed.signer = Address([0x77; 20]);
        let err = check(&verifier, &signed, true, ts(50)).unwrap_err();
        assert!(err.to_string().contains("not 0x7777"));
    }

    #[test]
    fn deadline_is_inclusive() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let verifier = DelegationVerifier::new(domain());
        let signed = sign_attestation(&kp, &domain(), request(), true, 0, ts(100)).unwrap();
        check(&verifier, &signed, true, ts(100)).unwrap();
        assert!(matches!(
            check(&verifier, &signed, true, ts(101)),
            Err(AttestError::ExpiredSignature { .. })
        ));
    }

    #[test]
    fn nonce_must_be_next_unused() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let mut verifier = DelegationVerifier::new(domain());
        let ahead = sign_attestation(&kp, &domain(), request(), true, 1, ts(100)).unwrap();
        assert!(matches!(
            check(&verifier, &ahead, true, ts(50)),
            Err(AttestError::InvalidNonce { expected: 0, got: 1, .. })
        ));

        verifier.consume(kp.address(), 0);
        assert_eq!(verifier.nonce_of(&kp.address()), 1);
        check(&verifier, &ahead, true, ts(50)).unwrap();
    }

    #[test]
    fn revocation_message_differs_from_attestation_message() {
        let d = domain();
        let revoke =
            revocation_message(&d, SchemaId([2; 32]), &RevocationRequest::new(Uid([1; 32])), 0, ts(5)).unwrap();
        let text = std::str::from_utf8(revoke.as_bytes()).unwrap();
        assert!(text.contains(r#""kind":"revoke""#));
        assert!(text.contains(r#""engine_id":"attest-local""#));
        assert!(text.contains(&format!(r#""schema":"0x{}""#, "02".repeat(32))));
    }

    #[test]
    fn revocation_schema_is_bound() {
        let kp = Ed25519KeyPair::from_seed(&[1; 32]);
        let verifier = DelegationVerifier::new(domain());
        let request = RevocationRequest::new(Uid([1; 32]));
        let signed = sign_revocation(&kp, &domain(), SchemaId([2; 32]), request, 0, ts(100)).unwrap();
        let check = |schema: SchemaId| {
            let message = revocation_message(verifier.domain(), schema, &request, 0, ts(100)).unwrap();
            verifier.verify(&message, &signed.signature, &signed.signer, 0, ts(100), ts(50))
        };
        check(SchemaId([2; 32])).unwrap();
        assert!(matches!(check(SchemaId([3; 32])), Err(AttestError::InvalidSignature(_))));
    }

    #[test]
    fn delegated_attestation_serde_roundtrip() {
        let kp = Ed25519KeyPair::from_seed(&[4; 32]);
        let signed = sign_attestation(&kp, &domain(), request(), true, 3, ts(100)).unwrap();
        let json = serde_json::to_string(&signed).unwrap();
        let back: DelegatedAttestation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signed);
    }
}
