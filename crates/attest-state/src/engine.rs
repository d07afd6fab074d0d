//! # Attestation Engine
//!
//! Owns the schema registry, the attestation ledger, the value ledger and
//! the delegation nonce table. Every mutating call takes `&mut self`, so
//! calls are serialized and a resolver hook (which only ever sees `&self`
//! of itself and a borrowed record) cannot re-enter the engine.
//!
//! ## Atomicity
//!
//! Single and batch calls share one path: validate every item into a
//! [`Staging`] buffer, then commit all of it. The first failing item aborts
//! the call with that item's error and the buffer is dropped. No record,
//! revocation, value credit or nonce survives a failed call.
//!
//! ## Attest checks, per item
//!
//! 1. Schema exists (`SchemaNotFound`).
//! 2. Expiration, when set, is strictly after now (`InvalidExpirationTime`).
//! 3. `ref_uid`, when set, names an existing unexpired attestation,
//!    possibly one staged earlier in the same batch (`InvalidAttestation`).
//! 4. Value is only sent to a payable resolver (`NotPayable`).
//! 5. The resolver accepts (`InvalidAttestation`).
//!
//! ## Revoke checks, per item
//!
//! `NotFound`, `NotRevocable`, `AlreadyRevoked`, `Unauthorized`, `Expired`,
//! `NotPayable`, then the resolver (`InvalidAttestation`). Only the attester
//! learns whether a record has expired.
//!
//! Every rejection, including batch-size and lookup failures that happen
//! before staging, goes through one path that logs it at `warn` and bumps
//! `attest_rejections_total`.

use std::sync::Arc;

use attest_core::{
    Address, Attestation, AttestationRequest, AttestationStatus, CallContext, Clock, RevocationRequest,
    SchemaId, SystemClock, Timestamp, Uid,
};
use attest_schema::{Resolver, Schema, SchemaRegistry};

use crate::config::EngineConfig;
use crate::delegation::{
    attestation_message, revocation_message, DelegatedAttestation, DelegatedRevocation,
    DelegationDomain, DelegationVerifier,
};
use crate::error::AttestError;
use crate::ledger::{AttestationLedger, Staging};
use crate::value::{declared_total, ValueLedger};

#[derive(Debug, Clone, Copy)]
enum Hook {
    Attest,
    Revoke,
}

/// The attestation service.
pub struct AttestationEngine {
    config: EngineConfig,
    registry: SchemaRegistry,
    ledger: AttestationLedger,
    value: ValueLedger,
    delegation: DelegationVerifier,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AttestationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationEngine")
            .field("engine_id", &self.config.engine_id)
            .field("schemas", &self.registry.len())
            .field("attestations", &self.ledger.len())
            .field("forwarded", &self.value.total())
            .finish()
    }
}

impl AttestationEngine {
    /// An engine reading the system clock.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// An engine reading `clock`.
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let delegation = DelegationVerifier::new(DelegationDomain::from_config(&config));
        Self {
            config,
            registry: SchemaRegistry::new(),
            ledger: AttestationLedger::new(),
            value: ValueLedger::new(),
            delegation,
            clock,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The delegation domain signers must sign against.
    pub fn domain(&self) -> &DelegationDomain {
        self.delegation.domain()
    }

    /// Current engine time.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The schema registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Mutable access to the schema registry.
    pub fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }

    /// Register a schema. See [`SchemaRegistry::register`].
    pub fn register_schema(
        &mut self,
        definition: impl Into<String>,
        resolver: Option<Arc<dyn Resolver>>,
        revocable: bool,
    ) -> Result<SchemaId, AttestError> {
        Ok(self.registry.register(definition, resolver, revocable)?)
    }

    // ── Attest ──────────────────────────────────────────────────────────

    /// Create one attestation with `ctx.sender` as attester.
    ///
    /// `ctx.value` must equal `request.value`.
    pub fn attest(&mut self, ctx: &CallContext, request: AttestationRequest) -> Result<Uid, AttestError> {
        let mut uids = self.attest_as(ctx, ctx.sender, vec![request])?;
        uids.pop().ok_or(AttestError::EmptyBatch)
    }

    /// Create several attestations atomically, returning uids in request
    /// order.
    ///
    /// `ctx.value` must equal the sum of the requests' values. Either every
    /// request is persisted or none is.
    pub fn attest_batch(
        &mut self,
        ctx: &CallContext,
        requests: Vec<AttestationRequest>,
    ) -> Result<Vec<Uid>, AttestError> {
        self.check_batch_size("attest", requests.len())?;
        self.attest_as(ctx, ctx.sender, requests)
    }

    /// Create an attestation authorized by a delegated signature. The
    /// signer becomes the attester; `ctx.sender` is only the relayer.
    pub fn attest_delegated(
        &mut self,
        ctx: &CallContext,
        delegated: &DelegatedAttestation,
    ) -> Result<Uid, AttestError> {
        let now = self.clock.now();
        let revocable = self
            .registry
            .get(&delegated.request.schema)
            .map_err(|e| self.reject("attest_delegated", 0, e.into()))?
            .revocable;
        let message = attestation_message(
            self.delegation.domain(),
            &delegated.request,
            revocable,
            delegated.nonce,
            delegated.deadline,
        )?;
        self.delegation
            .verify(
                &message,
                &delegated.signature,
                &delegated.signer,
                delegated.nonce,
                delegated.deadline,
                now,
            )
            .map_err(|e| self.reject("attest_delegated", 0, e))?;

        let mut uids = self.attest_as(ctx, delegated.signer, vec![delegated.request.clone()])?;
        self.delegation.consume(delegated.signer, delegated.nonce);
        tracing::debug!(
            signer = %delegated.signer,
            relayer = %ctx.sender,
            nonce = delegated.nonce,
            "consumed delegation nonce"
        );
        uids.pop().ok_or(AttestError::EmptyBatch)
    }

    fn attest_as(
        &mut self,
        ctx: &CallContext,
        attester: Address,
        requests: Vec<AttestationRequest>,
    ) -> Result<Vec<Uid>, AttestError> {
        let now = self.clock.now();
        check_value(ctx.value, requests.iter().map(|r| r.value))
            .map_err(|e| self.reject("attest", 0, e))?;

        let mut staging = Staging::new();
        for (index, request) in requests.into_iter().enumerate() {
            self.stage_attestation(&mut staging, attester, request, now)
                .map_err(|e| self.reject("attest", index, e))?;
        }

        let uids = staging.staged_uids();
        self.commit(staging);
        metrics::counter!("attest_attestations_total").increment(uids.len() as u64);
        tracing::info!(
            attester = %attester,
            count = uids.len(),
            value = ctx.value,
            "attestations committed"
        );
        Ok(uids)
    }

    fn stage_attestation(
        &self,
        staging: &mut Staging,
        attester: Address,
        request: AttestationRequest,
        now: Timestamp,
    ) -> Result<(), AttestError> {
        let schema = self.registry.get(&request.schema)?;

        if let Some(expiration) = request.expiration_time {
            if expiration <= now {
                return Err(AttestError::InvalidExpirationTime { expiration, now });
            }
        }

        if let Some(ref_uid) = request.ref_uid {
            match staging.lookup(&self.ledger, &ref_uid) {
                None => {
                    return Err(AttestError::InvalidAttestation(format!(
                        "referenced attestation {ref_uid} does not exist"
                    )))
                }
                Some(referenced) if referenced.is_expired_at(now) => {
                    return Err(AttestError::InvalidAttestation(format!(
                        "referenced attestation {ref_uid} has expired"
                    )))
                }
                Some(_) => {}
            }
        }

        let mut record = Attestation {
            uid: Uid([0; 32]),
            schema: schema.id,
            attester,
            recipient: request.recipient,
            time: now,
            expiration_time: request.expiration_time,
            revocation_time: None,
            ref_uid: request.ref_uid,
            revocable: schema.revocable,
            data: request.data,
            value: request.value,
        };
        record.uid = staging.mint_uid(&self.ledger, &record)?;

        let credit = run_resolver(schema, &record, request.value, Hook::Attest)?;
        tracing::debug!(uid = %record.uid, schema = %schema.id, "staged attestation");
        staging.stage_record(record, credit);
        Ok(())
    }

    // ── Revoke ──────────────────────────────────────────────────────────

    /// Revoke one attestation made by `ctx.sender`.
    pub fn revoke(&mut self, ctx: &CallContext, request: RevocationRequest) -> Result<(), AttestError> {
        self.revoke_as(ctx, ctx.sender, vec![request])
    }

    /// Revoke several attestations atomically.
    pub fn revoke_batch(
        &mut self,
        ctx: &CallContext,
        requests: Vec<RevocationRequest>,
    ) -> Result<(), AttestError> {
        self.check_batch_size("revoke", requests.len())?;
        self.revoke_as(ctx, ctx.sender, requests)
    }

    /// Revoke an attestation authorized by a delegated signature. The
    /// signer must be the original attester.
    pub fn revoke_delegated(
        &mut self,
        ctx: &CallContext,
        delegated: &DelegatedRevocation,
    ) -> Result<(), AttestError> {
        let now = self.clock.now();
        let uid = delegated.request.uid;
        let schema = match self.ledger.get(&uid) {
            Some(record) => record.schema,
            None => return Err(self.reject("revoke_delegated", 0, AttestError::NotFound(uid))),
        };
        let message = revocation_message(
            self.delegation.domain(),
            schema,
            &delegated.request,
            delegated.nonce,
            delegated.deadline,
        )?;
        self.delegation
            .verify(
                &message,
                &delegated.signature,
                &delegated.signer,
                delegated.nonce,
                delegated.deadline,
                now,
            )
            .map_err(|e| self.reject("revoke_delegated", 0, e))?;

        self.revoke_as(ctx, delegated.signer, vec![delegated.request])?;
        self.delegation.consume(delegated.signer, delegated.nonce);
        tracing::debug!(
            signer = %delegated.signer,
            relayer = %ctx.sender,
            nonce = delegated.nonce,
            "consumed delegation nonce"
        );
        Ok(())
    }

    fn revoke_as(
        &mut self,
        ctx: &CallContext,
        revoker: Address,
        requests: Vec<RevocationRequest>,
    ) -> Result<(), AttestError> {
        let now = self.clock.now();
        check_value(ctx.value, requests.iter().map(|r| r.value))
            .map_err(|e| self.reject("revoke", 0, e))?;

        let mut staging = Staging::new();
        for (index, request) in requests.iter().enumerate() {
            self.stage_revocation(&mut staging, revoker, request, now)
                .map_err(|e| self.reject("revoke", index, e))?;
        }

        let count = staging.len();
        self.commit(staging);
        metrics::counter!("attest_revocations_total").increment(count as u64);
        tracing::info!(revoker = %revoker, count, value = ctx.value, "revocations committed");
        Ok(())
    }

    fn stage_revocation(
        &self,
        staging: &mut Staging,
        revoker: Address,
        request: &RevocationRequest,
        now: Timestamp,
    ) -> Result<(), AttestError> {
        let uid = request.uid;
        let mut record = staging
            .lookup(&self.ledger, &uid)
            .ok_or(AttestError::NotFound(uid))?;
        let schema = self.registry.get(&record.schema)?;

        if !record.revocable {
            return Err(AttestError::NotRevocable(uid));
        }
        if record.is_revoked() {
            return Err(AttestError::AlreadyRevoked(uid));
        }
        if record.attester != revoker {
            return Err(AttestError::Unauthorized { uid, sender: revoker });
        }
        if record.is_expired_at(now) {
            return Err(AttestError::Expired(uid));
        }

        record.revocation_time = Some(now);
        let credit = run_resolver(schema, &record, request.value, Hook::Revoke)?;
        tracing::debug!(%uid, "staged revocation");
        staging.stage_revocation(uid, now, credit);
        Ok(())
    }

    // ── Commit ──────────────────────────────────────────────────────────

    fn commit(&mut self, staging: Staging) {
        let (records, revocations, credits) = staging.into_parts();
        self.ledger.commit(records, &revocations);
        self.value.credit_all(credits);
    }

    fn check_batch_size(&self, operation: &'static str, size: usize) -> Result<(), AttestError> {
        let max = self.config.max_batch_size;
        let err = match size {
            0 => AttestError::EmptyBatch,
            n if n > max => AttestError::BatchTooLarge { size, max },
            _ => return Ok(()),
        };
        Err(self.reject(operation, 0, err))
    }

    fn reject(&self, operation: &'static str, index: usize, err: AttestError) -> AttestError {
        metrics::counter!("attest_rejections_total", "kind" => err.kind()).increment(1);
        tracing::warn!(operation, index, kind = err.kind(), error = %err, "call rejected");
        err
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// The attestation with `uid`, if any.
    pub fn get_attestation(&self, uid: &Uid) -> Option<&Attestation> {
        self.ledger.get(uid)
    }

    /// Whether `uid` exists, is not revoked, has not expired and, when
    /// `schema` is given, was made under that schema.
    pub fn is_valid(&self, uid: &Uid, schema: Option<&SchemaId>) -> bool {
        let now = self.clock.now();
        match self.ledger.get(uid) {
            Some(record) => {
                record.status_at(now) == AttestationStatus::Active
                    && schema.map_or(true, |s| record.schema == *s)
            }
            None => false,
        }
    }

    /// Derived status of `uid` as of now.
    pub fn status(&self, uid: &Uid) -> Option<AttestationStatus> {
        let now = self.clock.now();
        self.ledger.get(uid).map(|r| r.status_at(now))
    }

    /// Number of attestations ever committed.
    pub fn attestation_count(&self) -> usize {
        self.ledger.len()
    }

    /// Iterate committed attestations in no particular order.
    pub fn attestations(&self) -> impl Iterator<Item = &Attestation> {
        self.ledger.iter()
    }

    /// `signer`'s next unused delegation nonce.
    pub fn nonce_of(&self, signer: &Address) -> u64 {
        self.delegation.nonce_of(signer)
    }

    /// Value credited to the resolver at `resolver`.
    pub fn resolver_balance(&self, resolver: &Address) -> u64 {
        self.value.balance(resolver)
    }

    /// Value credited across all resolvers.
    pub fn total_forwarded(&self) -> u64 {
        self.value.total()
    }
}

fn check_value(attached: u64, values: impl Iterator<Item = u64>) -> Result<(), AttestError> {
    let declared = declared_total(values);
    if declared != Some(attached) {
        return Err(AttestError::ValueMismatch { attached, declared });
    }
    Ok(())
}

/// Run the schema's resolver hook and return the credit to stage.
fn run_resolver(
    schema: &Schema,
    record: &Attestation,
    value: u64,
    hook: Hook,
) -> Result<Option<(Address, u64)>, AttestError> {
    let Some(handle) = &schema.resolver else {
        if value > 0 {
            return Err(AttestError::NotPayable(schema.id));
        }
        return Ok(None);
    };

    let resolver = handle.resolver();
    if value > 0 && !resolver.is_payable() {
        return Err(AttestError::NotPayable(schema.id));
    }

    let accepted = match hook {
        Hook::Attest => resolver.on_attest(record, value),
        Hook::Revoke => resolver.on_revoke(record, value),
    };
    if !accepted {
        return Err(AttestError::InvalidAttestation(format!(
            "resolver {} rejected {:?} of {}",
            handle.address(),
            hook,
            record.uid
        )));
    }
    Ok((value > 0).then(|| (handle.address(), value)))
}
