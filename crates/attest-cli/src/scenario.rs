//! # Scenario Runner
//!
//! `attest run <scenario.yaml>` builds a fresh engine on a manual clock,
//! registers the scenario's schemas, then executes its steps in order.
//! Each step declares the outcome it expects (`ok` or an error kind such
//! as `InvalidAttestation`); the runner prints one JSON line per step and
//! exits non-zero if any step's outcome differs from its expectation.
//!
//! ```yaml
//! start_time: "2024-01-01T00:00:00Z"
//! actors:
//!   sender: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
//!   target: "0x0505050505050505050505050505050505050505"
//! keys:
//!   alice: "4242424242424242424242424242424242424242424242424242424242424242"
//! schemas:
//!   ticket:
//!     definition: "bytes32 eventId,uint8 ticketType,uint32 ticketNum"
//!     revocable: true
//!     resolver: { kind: recipient, address: "0x5e5e…", target: target }
//! steps:
//!   - name: first
//!     attest:
//!       from: sender
//!       requests: [{ schema: ticket, recipient: target, data: "0x1234" }]
//!   - revoke: { from: sender, targets: [first] }
//!   - revoke: { from: sender, targets: [first] }
//!     expect: AlreadyRevoked
//! ```
//!
//! Parties are looked up in `keys` (by derived address), then `actors`,
//! then parsed as a literal address. Attestation references are a step
//! name (its only uid), `name.N` (the N-th uid of a batch step), or a
//! literal uid.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use attest_core::{
    hex, Address, AttestationRequest, CallContext, ManualClock, RevocationRequest, SchemaId, Timestamp, Uid,
};
use attest_crypto::Ed25519KeyPair;
use attest_schema::resolvers::{
    AttesterResolver, CompositeResolver, DataResolver, ExpirationTimeResolver, MinimumValueResolver,
    NoopResolver, PayableResolver, RecipientResolver, RevocationResolver, ValueResolver,
};
use attest_schema::Resolver;
use attest_state::{sign_attestation, sign_revocation, AttestError, AttestationEngine, EngineConfig};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::keys::keypair_from_seed_hex;

/// Default scenario start: 2023-11-14T22:13:20Z.
const DEFAULT_START_SECS: i64 = 1_700_000_000;

/// Arguments for `attest run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the scenario file.
    pub scenario: PathBuf,
}

/// A scripted run.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Initial engine time.
    #[serde(default)]
    pub start_time: Option<Timestamp>,
    /// Named plain addresses.
    #[serde(default)]
    pub actors: BTreeMap<String, Address>,
    /// Named signing seeds (hex).
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
    /// Schemas to register before the first step.
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaSpec>,
    /// Steps, executed in order.
    pub steps: Vec<Step>,
}

/// A schema to register.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSpec {
    /// Claim definition.
    pub definition: String,
    /// Whether attestations may be revoked.
    #[serde(default = "default_true")]
    pub revocable: bool,
    /// Bound resolver.
    #[serde(default)]
    pub resolver: Option<ResolverSpec>,
}

fn default_true() -> bool {
    true
}

/// A resolver to build and bind.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ResolverSpec {
    /// Accepts everything, refuses value.
    Noop { address: Address },
    /// Accepts everything, including value.
    Payable { address: Address },
    /// Only attestations to `target`.
    Recipient { address: Address, target: String },
    /// Only attestations by `target`.
    Attester { address: Address, target: String },
    /// Exactly `amount` on attest, nothing on revoke.
    Value { address: Address, amount: u64 },
    /// At least `threshold` on attest.
    MinimumValue { address: Address, threshold: u64 },
    /// Payload must be one of `allowed` (hex).
    Data { address: Address, allowed: Vec<String> },
    /// Payload must be `0x00` or `0x01`.
    Boolean { address: Address },
    /// Expiration at least `min_expiration_in` seconds after the scenario start.
    Expiration { address: Address, min_expiration_in: i64 },
    /// Revocations allowed while the toggle is on.
    Revocation { address: Address, allow: bool },
    /// Every child must accept.
    All { address: Address, children: Vec<ResolverSpec> },
    /// At least one child must accept.
    Any { address: Address, children: Vec<ResolverSpec> },
}

/// One scripted step.
#[derive(Debug, Deserialize)]
pub struct Step {
    /// Label under which the step's uids are recorded.
    #[serde(default)]
    pub name: Option<String>,
    /// What to do.
    #[serde(flatten)]
    pub action: Action,
    /// `ok` or an error kind.
    #[serde(default = "default_expect")]
    pub expect: String,
}

fn default_expect() -> String {
    "ok".to_string()
}

/// A step's operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Direct attestation (batch when more than one request).
    Attest {
        from: String,
        #[serde(default)]
        value: Option<u64>,
        requests: Vec<RequestSpec>,
    },
    /// Direct revocation (batch when more than one target).
    Revoke {
        from: String,
        #[serde(default)]
        value: Option<u64>,
        targets: Vec<String>,
        #[serde(default)]
        values: Vec<u64>,
    },
    /// Delegated attestation signed by a named key.
    AttestDelegated {
        signer: String,
        relayer: String,
        request: RequestSpec,
        #[serde(default)]
        nonce: Option<u64>,
        #[serde(default = "default_deadline_in")]
        deadline_in: i64,
        #[serde(default)]
        revocable: Option<bool>,
    },
    /// Delegated revocation signed by a named key.
    RevokeDelegated {
        signer: String,
        relayer: String,
        target: String,
        #[serde(default)]
        value: u64,
        #[serde(default)]
        nonce: Option<u64>,
        #[serde(default = "default_deadline_in")]
        deadline_in: i64,
    },
    /// Move the clock.
    Advance { secs: i64 },
    /// Flip a revocation resolver's toggle.
    SetRevocation { schema: String, allow: bool },
}

fn default_deadline_in() -> i64 {
    3600
}

/// An attestation request with named references.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSpec {
    /// Schema name.
    pub schema: String,
    /// Recipient party.
    #[serde(default)]
    pub recipient: Option<String>,
    /// Seconds from now until expiration.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Referenced attestation.
    #[serde(default, rename = "ref")]
    pub ref_uid: Option<String>,
    /// Payload.
    #[serde(default, with = "attest_core::hex::serde_bytes")]
    pub data: Vec<u8>,
    /// Value forwarded to the resolver.
    #[serde(default)]
    pub value: u64,
}

/// Outcome of one step, printed as a JSON line.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepReport {
    /// Zero-based position.
    pub step: usize,
    /// Step label, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Operation name.
    pub action: &'static str,
    /// `ok` or the error kind.
    pub outcome: String,
    /// Declared expectation.
    pub expected: String,
    /// Whether outcome and expectation agree.
    pub matched: bool,
    /// Uids created by the step.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uids: Vec<Uid>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Scenario {
    /// Parse a scenario document.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("failed to parse scenario")
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }
}

/// Live state of a scenario run.
pub struct ScenarioRunner {
    engine: AttestationEngine,
    clock: ManualClock,
    start: Timestamp,
    actors: BTreeMap<String, Address>,
    keys: BTreeMap<String, Ed25519KeyPair>,
    schemas: BTreeMap<String, SchemaId>,
    toggles: HashMap<String, Arc<RevocationResolver>>,
    labels: HashMap<String, Uid>,
}

impl ScenarioRunner {
    /// Build the engine and register every schema in `scenario`.
    pub fn new(scenario: &Scenario, config: EngineConfig) -> Result<Self> {
        let start = match scenario.start_time {
            Some(t) => t,
            None => Timestamp::from_epoch_secs(DEFAULT_START_SECS)?,
        };
        let clock = ManualClock::new(start);
        let engine = AttestationEngine::with_clock(config, Arc::new(clock.clone()));

        let mut keys = BTreeMap::new();
        for (name, seed) in &scenario.keys {
            let kp = keypair_from_seed_hex(seed).with_context(|| format!("key {name:?}"))?;
            keys.insert(name.clone(), kp);
        }

        let mut runner = Self {
            engine,
            clock,
            start,
            actors: scenario.actors.clone(),
            keys,
            schemas: BTreeMap::new(),
            toggles: HashMap::new(),
            labels: HashMap::new(),
        };

        for (name, spec) in &scenario.schemas {
            let resolver = match &spec.resolver {
                Some(r) => Some(runner.build_resolver(name, r)?),
                None => None,
            };
            let id = runner
                .engine
                .register_schema(spec.definition.clone(), resolver, spec.revocable)
                .with_context(|| format!("failed to register schema {name:?}"))?;
            tracing::debug!(schema = %name, id = %id, "registered scenario schema");
            runner.schemas.insert(name.clone(), id);
        }
        Ok(runner)
    }

    /// The engine under test.
    pub fn engine(&self) -> &AttestationEngine {
        &self.engine
    }

    /// Execute every step and collect reports. Setup errors inside a step
    /// (unknown party, unknown schema name) abort the run.
    pub fn run(&mut self, steps: &[Step]) -> Result<Vec<StepReport>> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_step(index, step))
            .collect()
    }

    fn run_step(&mut self, index: usize, step: &Step) -> Result<StepReport> {
        let (action, result) = match &step.action {
            Action::Attest { from, value, requests } => ("attest", self.attest(from, *value, requests)?),
            Action::Revoke {
                from,
                value,
                targets,
                values,
            } => ("revoke", self.revoke(from, *value, targets, values)?),
            Action::AttestDelegated {
                signer,
                relayer,
                request,
                nonce,
                deadline_in,
                revocable,
            } => (
                "attest_delegated",
                self.attest_delegated(signer, relayer, request, *nonce, *deadline_in, *revocable)?,
            ),
            Action::RevokeDelegated {
                signer,
                relayer,
                target,
                value,
                nonce,
                deadline_in,
            } => (
                "revoke_delegated",
                self.revoke_delegated(signer, relayer, target, *value, *nonce, *deadline_in)?,
            ),
            Action::Advance { secs } => {
                self.clock.advance(*secs);
                ("advance", Ok(Vec::new()))
            }
            Action::SetRevocation { schema, allow } => {
                let toggle = self
                    .toggles
                    .get(schema)
                    .ok_or_else(|| anyhow!("schema {schema:?} has no revocation resolver"))?;
                toggle.set_revocation(*allow);
                ("set_revocation", Ok(Vec::new()))
            }
        };

        let (outcome, uids, error) = match result {
            Ok(uids) => ("ok".to_string(), uids, None),
            Err(e) => (e.kind().to_string(), Vec::new(), Some(e.to_string())),
        };

        if let Some(name) = &step.name {
            if uids.len() == 1 {
                self.labels.insert(name.clone(), uids[0]);
            }
            for (i, uid) in uids.iter().enumerate() {
                self.labels.insert(format!("{name}.{i}"), *uid);
            }
        }

        let matched = outcome == step.expect;
        if !matched {
            tracing::warn!(step = index, expected = %step.expect, %outcome, "step outcome mismatch");
        }
        Ok(StepReport {
            step: index,
            name: step.name.clone(),
            action,
            outcome,
            expected: step.expect.clone(),
            matched,
            uids,
            error,
        })
    }

    fn attest(
        &mut self,
        from: &str,
        value: Option<u64>,
        specs: &[RequestSpec],
    ) -> Result<Result<Vec<Uid>, AttestError>> {
        let sender = self.party(from)?;
        let requests = specs
            .iter()
            .map(|s| self.request(s))
            .collect::<Result<Vec<_>>>()?;
        let declared: u64 = requests.iter().map(|r| r.value).fold(0, u64::saturating_add);
        let ctx = CallContext::new(sender).with_value(value.unwrap_or(declared));

        Ok(match requests.len() {
            1 => {
                let request = requests.into_iter().next().ok_or_else(|| anyhow!("empty request list"))?;
                self.engine.attest(&ctx, request).map(|uid| vec![uid])
            }
            _ => self.engine.attest_batch(&ctx, requests),
        })
    }

    fn revoke(
        &mut self,
        from: &str,
        value: Option<u64>,
        targets: &[String],
        values: &[u64],
    ) -> Result<Result<Vec<Uid>, AttestError>> {
        let sender = self.party(from)?;
        let requests = targets
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let value = values.get(i).copied().unwrap_or(0);
                Ok(RevocationRequest::new(self.uid(t)?).value(value))
            })
            .collect::<Result<Vec<_>>>()?;
        let declared: u64 = requests.iter().map(|r| r.value).fold(0, u64::saturating_add);
        let ctx = CallContext::new(sender).with_value(value.unwrap_or(declared));

        let result = match requests.len() {
            1 => self.engine.revoke(&ctx, requests[0]),
            _ => self.engine.revoke_batch(&ctx, requests),
        };
        Ok(result.map(|()| Vec::new()))
    }

    fn attest_delegated(
        &mut self,
        signer: &str,
        relayer: &str,
        spec: &RequestSpec,
        nonce: Option<u64>,
        deadline_in: i64,
        revocable: Option<bool>,
    ) -> Result<Result<Vec<Uid>, AttestError>> {
        let relayer = self.party(relayer)?;
        let request = self.request(spec)?;
        let deadline = self.offset(deadline_in)?;
        let keypair = self.key(signer)?;
        let nonce = nonce.unwrap_or_else(|| self.engine.nonce_of(&keypair.address()));
        let revocable = match revocable {
            Some(r) => r,
            None => self
                .engine
                .registry()
                .get(&request.schema)
                .map(|s| s.revocable)
                .unwrap_or(true),
        };
        let ctx = CallContext::new(relayer).with_value(request.value);
        let signed = sign_attestation(keypair, self.engine.domain(), request, revocable, nonce, deadline)?;
        Ok(self.engine.attest_delegated(&ctx, &signed).map(|uid| vec![uid]))
    }

    fn revoke_delegated(
        &mut self,
        signer: &str,
        relayer: &str,
        target: &str,
        value: u64,
        nonce: Option<u64>,
        deadline_in: i64,
    ) -> Result<Result<Vec<Uid>, AttestError>> {
        let relayer = self.party(relayer)?;
        let request = RevocationRequest::new(self.uid(target)?).value(value);
        let schema = self
            .engine
            .get_attestation(&request.uid)
            .map_or(SchemaId([0; 32]), |record| record.schema);
        let deadline = self.offset(deadline_in)?;
        let keypair = self.key(signer)?;
        let nonce = nonce.unwrap_or_else(|| self.engine.nonce_of(&keypair.address()));
        let ctx = CallContext::new(relayer).with_value(value);
        let signed = sign_revocation(keypair, self.engine.domain(), schema, request, nonce, deadline)?;
        Ok(self.engine.revoke_delegated(&ctx, &signed).map(|()| Vec::new()))
    }

    fn request(&self, spec: &RequestSpec) -> Result<AttestationRequest> {
        let mut request = AttestationRequest::new(self.schema(&spec.schema)?)
            .data(spec.data.clone())
            .value(spec.value);
        if let Some(r) = &spec.recipient {
            request.recipient = Some(self.party(r)?);
        }
        if let Some(secs) = spec.expires_in {
            request.expiration_time = Some(self.offset(secs)?);
        }
        if let Some(r) = &spec.ref_uid {
            request.ref_uid = Some(self.uid(r)?);
        }
        Ok(request)
    }

    fn build_resolver(&mut self, schema: &str, spec: &ResolverSpec) -> Result<Arc<dyn Resolver>> {
        let resolver: Arc<dyn Resolver> = match spec {
            ResolverSpec::Noop { address } => Arc::new(NoopResolver::new(*address)),
            ResolverSpec::Payable { address } => Arc::new(PayableResolver::new(*address)),
            ResolverSpec::Recipient { address, target } => {
                Arc::new(RecipientResolver::new(*address, self.party(target)?))
            }
            ResolverSpec::Attester { address, target } => {
                Arc::new(AttesterResolver::new(*address, self.party(target)?))
            }
            ResolverSpec::Value { address, amount } => Arc::new(ValueResolver::new(*address, *amount)),
            ResolverSpec::MinimumValue { address, threshold } => {
                Arc::new(MinimumValueResolver::new(*address, *threshold))
            }
            ResolverSpec::Data { address, allowed } => {
                let allowed = allowed
                    .iter()
                    .map(|h| hex::decode(h).with_context(|| format!("invalid allowed payload {h:?}")))
                    .collect::<Result<Vec<_>>>()?;
                Arc::new(DataResolver::new(*address, allowed))
            }
            ResolverSpec::Boolean { address } => Arc::new(DataResolver::boolean(*address)),
            ResolverSpec::Expiration {
                address,
                min_expiration_in,
            } => {
                let threshold = self
                    .start
                    .checked_add_secs(*min_expiration_in)
                    .ok_or_else(|| anyhow!("expiration threshold out of range"))?;
                Arc::new(ExpirationTimeResolver::new(*address, threshold))
            }
            ResolverSpec::Revocation { address, allow } => {
                let toggle = Arc::new(RevocationResolver::new(*address, *allow));
                self.toggles.insert(schema.to_string(), toggle.clone());
                toggle
            }
            ResolverSpec::All { address, children } => {
                let children = self.build_children(schema, children)?;
                Arc::new(CompositeResolver::all(*address, children))
            }
            ResolverSpec::Any { address, children } => {
                let children = self.build_children(schema, children)?;
                Arc::new(CompositeResolver::any(*address, children))
            }
        };
        Ok(resolver)
    }

    fn build_children(&mut self, schema: &str, specs: &[ResolverSpec]) -> Result<Vec<Arc<dyn Resolver>>> {
        specs.iter().map(|c| self.build_resolver(schema, c)).collect()
    }

    fn party(&self, name: &str) -> Result<Address> {
        if let Some(kp) = self.keys.get(name) {
            return Ok(kp.address());
        }
        if let Some(addr) = self.actors.get(name) {
            return Ok(*addr);
        }
        Address::from_hex(name).with_context(|| format!("unknown party {name:?}"))
    }

    fn key(&self, name: &str) -> Result<&Ed25519KeyPair> {
        self.keys.get(name).ok_or_else(|| anyhow!("unknown key {name:?}"))
    }

    fn schema(&self, name: &str) -> Result<SchemaId> {
        if let Some(id) = self.schemas.get(name) {
            return Ok(*id);
        }
        SchemaId::from_hex(name).with_context(|| format!("unknown schema {name:?}"))
    }

    fn uid(&self, label: &str) -> Result<Uid> {
        if let Some(uid) = self.labels.get(label) {
            return Ok(*uid);
        }
        Uid::from_hex(label).with_context(|| format!("unknown attestation reference {label:?}"))
    }

    fn offset(&self, secs: i64) -> Result<Timestamp> {
        self.engine
            .now()
            .checked_add_secs(secs)
            .ok_or_else(|| anyhow!("time offset {secs} out of range"))
    }
}

/// Execute `attest run`.
pub fn run_scenario(args: &RunArgs, config: EngineConfig) -> Result<u8> {
    let scenario = Scenario::load(&args.scenario)?;
    if scenario.steps.is_empty() {
        bail!("scenario {} has no steps", args.scenario.display());
    }
    let mut runner = ScenarioRunner::new(&scenario, config)?;
    let reports = runner.run(&scenario.steps)?;

    let mut mismatches = 0usize;
    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
        if !report.matched {
            mismatches += 1;
        }
    }
    tracing::info!(
        steps = reports.len(),
        mismatches,
        attestations = runner.engine().attestation_count(),
        "scenario finished"
    );
    Ok(if mismatches == 0 { 0 } else { 1 })
}
