//! # Keygen Subcommand
//!
//! Prints a seed, public key and derived address as JSON. The seed is the
//! only secret; every other subcommand takes it as `--seed-hex`.

use anyhow::{Context, Result};
use attest_core::hex;
use attest_crypto::Ed25519KeyPair;
use clap::Args;
use rand::RngCore;
use serde::Serialize;

/// Arguments for `attest keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Derive the key from this 32-byte hex seed instead of generating one.
    #[arg(long)]
    pub seed_hex: Option<String>,
}

/// JSON printed by `attest keygen`.
#[derive(Debug, Serialize)]
pub struct KeyReport {
    /// 32-byte seed, hex.
    pub seed: String,
    /// Ed25519 public key, hex.
    pub public_key: String,
    /// Address derived from the public key.
    pub address: String,
}

/// Parse a 32-byte hex seed into a key pair.
pub fn keypair_from_seed_hex(seed_hex: &str) -> Result<Ed25519KeyPair> {
    let seed: [u8; 32] = hex::decode_array(seed_hex, "seed").context("invalid --seed-hex")?;
    Ok(Ed25519KeyPair::from_seed(&seed))
}

/// Build the report for `seed`.
pub fn key_report(seed: &[u8; 32]) -> KeyReport {
    let kp = Ed25519KeyPair::from_seed(seed);
    KeyReport {
        seed: hex::encode(seed),
        public_key: kp.public_key().to_hex(),
        address: kp.address().to_string(),
    }
}

/// Execute `attest keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let seed: [u8; 32] = match &args.seed_hex {
        Some(s) => hex::decode_array(s, "seed").context("invalid --seed-hex")?,
        None => {
            let mut seed = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed);
            seed
        }
    };
    let report = key_report(&seed);
    tracing::debug!(address = %report.address, "generated key");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_deterministic_for_a_seed() {
        let a = key_report(&[7; 32]);
        let b = key_report(&[7; 32]);
        assert_eq!(a.address, b.address);
        assert_eq!(a.seed, "07".repeat(32));
        assert!(a.address.starts_with("0x"));
        assert_eq!(a.address.len(), 42);
    }

    #[test]
    fn seed_hex_round_trips_to_the_same_key() {
        let kp = keypair_from_seed_hex(&"07".repeat(32)).unwrap();
        assert_eq!(kp.address().to_string(), key_report(&[7; 32]).address);
    }

    #[test]
    fn short_seed_is_rejected() {
        assert!(keypair_from_seed_hex("abcd").is_err());
    }
}
