//! # Delegated Signing Subcommands
//!
//! `sign-attest` and `sign-revoke` build the canonical delegation message
//! for the configured engine domain, sign it with the given seed, and print
//! the relayable request as JSON.

use anyhow::{Context, Result};
use attest_core::{hex, AttestationRequest, RevocationRequest, Timestamp};
use attest_state::{sign_attestation, sign_revocation, DelegationDomain, EngineConfig};
use clap::Args;

use crate::keys::keypair_from_seed_hex;

/// Arguments for `attest sign-attest`.
#[derive(Args, Debug)]
pub struct SignAttestArgs {
    /// Signer's 32-byte hex seed.
    #[arg(long)]
    pub seed_hex: String,

    /// Target schema id.
    #[arg(long)]
    pub schema: attest_core::SchemaId,

    /// Recipient address.
    #[arg(long)]
    pub recipient: Option<attest_core::Address>,

    /// Expiration time (RFC 3339, UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub expiration: Option<Timestamp>,

    /// Referenced attestation uid.
    #[arg(long)]
    pub ref_uid: Option<attest_core::Uid>,

    /// Payload as hex.
    #[arg(long, default_value = "")]
    pub data: String,

    /// Value to forward to the schema's resolver.
    #[arg(long, default_value_t = 0)]
    pub value: u64,

    /// Signer's next unused nonce.
    #[arg(long, default_value_t = 0)]
    pub nonce: u64,

    /// Last instant the signature is valid (RFC 3339, UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub deadline: Timestamp,

    /// The target schema is irrevocable.
    #[arg(long)]
    pub irrevocable: bool,
}

/// Arguments for `attest sign-revoke`.
#[derive(Args, Debug)]
pub struct SignRevokeArgs {
    /// Signer's 32-byte hex seed.
    #[arg(long)]
    pub seed_hex: String,

    /// Schema the target attestation was made under.
    #[arg(long)]
    pub schema: attest_core::SchemaId,

    /// Attestation to revoke.
    #[arg(long)]
    pub uid: attest_core::Uid,

    /// Value to forward to the schema's resolver.
    #[arg(long, default_value_t = 0)]
    pub value: u64,

    /// Signer's next unused nonce.
    #[arg(long, default_value_t = 0)]
    pub nonce: u64,

    /// Last instant the signature is valid (RFC 3339, UTC).
    #[arg(long, value_parser = parse_timestamp)]
    pub deadline: Timestamp,
}

/// Clap value parser for [`Timestamp`].
pub fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    Timestamp::parse(s).map_err(|e| e.to_string())
}

/// Execute `attest sign-attest`.
pub fn run_sign_attest(args: &SignAttestArgs, config: &EngineConfig) -> Result<u8> {
    let keypair = keypair_from_seed_hex(&args.seed_hex)?;
    let mut request = AttestationRequest::new(args.schema)
        .data(hex::decode(&args.data).context("invalid --data")?)
        .value(args.value);
    request.recipient = args.recipient;
    request.expiration_time = args.expiration;
    request.ref_uid = args.ref_uid;

    let domain = DelegationDomain::from_config(config);
    let signed = sign_attestation(&keypair, &domain, request, !args.irrevocable, args.nonce, args.deadline)?;
    tracing::info!(signer = %signed.signer, nonce = signed.nonce, "signed delegated attestation");
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(0)
}

/// Execute `attest sign-revoke`.
pub fn run_sign_revoke(args: &SignRevokeArgs, config: &EngineConfig) -> Result<u8> {
    let keypair = keypair_from_seed_hex(&args.seed_hex)?;
    let request = RevocationRequest::new(args.uid).value(args.value);
    let domain = DelegationDomain::from_config(config);
    let signed = sign_revocation(&keypair, &domain, args.schema, request, args.nonce, args.deadline)?;
    tracing::info!(signer = %signed.signer, nonce = signed.nonce, "signed delegated revocation");
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(0)
}
