//! `attest` binary. Stdout carries command output; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use attest_cli::keys::{run_keygen, KeygenArgs};
use attest_cli::load_config;
use attest_cli::scenario::{run_scenario, RunArgs};
use attest_cli::sign::{run_sign_attest, run_sign_revoke, SignAttestArgs, SignRevokeArgs};

/// Attestation engine toolchain.
///
/// Generates signing keys, signs delegated attestation and revocation
/// requests, and runs scripted scenarios against an in-memory engine.
#[derive(Parser, Debug)]
#[command(name = "attest", version, about, long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). Warnings are always shown.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 key pair and print its address.
    Keygen(KeygenArgs),

    /// Sign an attestation request for delegated submission.
    SignAttest(SignAttestArgs),

    /// Sign a revocation request for delegated submission.
    SignRevoke(SignRevokeArgs),

    /// Run a YAML scenario against a fresh engine.
    Run(RunArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::SignAttest(args) => run_sign_attest(args, &config),
        Commands::SignRevoke(args) => run_sign_revoke(args, &config),
        Commands::Run(args) => run_scenario(args, config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// `RUST_LOG`-style filter for a `-v` count.
fn log_filter(verbose: u8) -> EnvFilter {
    const LEVELS: [&str; 4] = ["warn", "info", "debug", "trace"];
    EnvFilter::new(LEVELS[usize::from(verbose).min(LEVELS.len() - 1)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_keygen_with_seed() {
        let cli = Cli::try_parse_from(["attest", "keygen", "--seed-hex", "00"]).unwrap();
        if let Commands::Keygen(args) = cli.command {
            assert_eq!(args.seed_hex.as_deref(), Some("00"));
        } else {
            panic!("expected keygen");
        }
    }

    #[test]
    fn cli_parse_run_with_global_config() {
        let cli = Cli::try_parse_from(["attest", "run", "s.yaml", "--config", "engine.yaml", "-vv"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("engine.yaml")));
        assert_eq!(cli.verbose, 2);
        if let Commands::Run(args) = cli.command {
            assert_eq!(args.scenario, PathBuf::from("s.yaml"));
        } else {
            panic!("expected run");
        }
    }

    #[test]
    fn cli_parse_sign_attest() {
        let schema = format!("0x{}", "11".repeat(32));
        let recipient = format!("0x{}", "22".repeat(20));
        let cli = Cli::try_parse_from([
            "attest",
            "sign-attest",
            "--seed-hex",
            "aa",
            "--schema",
            schema.as_str(),
            "--recipient",
            recipient.as_str(),
            "--data",
            "0x01",
            "--nonce",
            "3",
            "--deadline",
            "2030-01-01T00:00:00Z",
            "--irrevocable",
        ])
        .unwrap();
        if let Commands::SignAttest(args) = cli.command {
            assert_eq!(args.nonce, 3);
            assert!(args.irrevocable);
            assert_eq!(args.recipient.map(|a| a.to_string()), Some(recipient));
            assert_eq!(args.value, 0);
            assert!(args.expiration.is_none());
        } else {
            panic!("expected sign-attest");
        }
    }

    #[test]
    fn cli_parse_sign_revoke_requires_deadline() {
        let uid = format!("0x{}", "33".repeat(32));
        assert!(Cli::try_parse_from(["attest", "sign-revoke", "--seed-hex", "aa", "--uid", uid.as_str()]).is_err());
    }

    #[test]
    fn cli_parse_sign_revoke_takes_target_schema() {
        let uid = format!("0x{}", "33".repeat(32));
        let schema = format!("0x{}", "44".repeat(32));
        let base = ["attest", "sign-revoke", "--seed-hex", "aa", "--uid", uid.as_str(), "--deadline", "2030-01-01T00:00:00Z"];
        assert!(Cli::try_parse_from(base).is_err());

        let cli = Cli::try_parse_from(base.iter().copied().chain(["--schema", schema.as_str()])).unwrap();
        if let Commands::SignRevoke(args) = cli.command {
            assert_eq!(args.schema.to_string(), schema);
        } else {
            panic!("expected sign-revoke");
        }
    }

    #[test]
    fn cli_rejects_bad_schema_id() {
        assert!(Cli::try_parse_from([
            "attest",
            "sign-attest",
            "--seed-hex",
            "aa",
            "--schema",
            "0x12",
            "--deadline",
            "2030-01-01T00:00:00Z",
        ])
        .is_err());
    }

    #[test]
    fn verbosity_saturates_at_trace() {
        assert_eq!(log_filter(9).to_string(), log_filter(3).to_string());
        assert_ne!(log_filter(0).to_string(), log_filter(3).to_string());
    }
}
