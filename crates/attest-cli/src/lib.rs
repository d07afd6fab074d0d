//! # attest-cli: Command-Line Front End
//!
//! Provides the `attest` binary.
//!
//! ## Subcommands
//!
//! - `attest keygen`: Ed25519 key pair for delegated signing.
//! - `attest sign-attest` / `attest sign-revoke`: produce a signed
//!   delegated request as JSON, ready for a relayer.
//! - `attest run`: execute a YAML scenario against a fresh engine and
//!   report one JSON line per step.
//!
//! ```bash
//! attest keygen --seed-hex 4242…42
//! attest --config engine.yaml sign-attest --seed-hex … --schema 0x… --deadline 2030-01-01T00:00:00Z
//! attest run scenarios/recipient.yaml
//! ```

pub mod keys;
pub mod scenario;
pub mod sign;

use std::path::Path;

use anyhow::{Context, Result};
use attest_state::EngineConfig;

/// Load the engine configuration, falling back to defaults when no path is
/// given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load(p)
            .with_context(|| format!("failed to load engine config {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}
