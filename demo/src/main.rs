//! Semblance Gateway — Demo CLI
//!
//! Wires real gateway components (allowlist, HMAC attestors, hash-chained
//! audit trail, dispatcher) around a mock adapter, runs a batch of actions
//! through the pipeline, and prints the per-service report plus the chain
//! verification result.
//!
//! Usage:
//!   cargo run -p demo -- run
//!   cargo run -p demo -- run --allowlist path/to/allowlist.toml
//!   cargo run -p demo -- verify
//!   RUST_LOG=debug cargo run -p demo -- run
//!
//! `verify` dispatches the same batch but prints only the chain check — a
//! quick way to confirm ledger integrity without the full report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use semblance_allowlist::{Allowlist, AllowlistConfig};
use semblance_attest::HmacAttestor;
use semblance_contracts::{
    action::ActionType,
    dispatch::{AdapterOutcome, DispatchRequest},
    error::GatewayResult,
};
use semblance_core::{
    traits::{ActionAdapter, AttestationSigner},
    Dispatcher,
};
use semblance_audit::{AuditQuery, ChainVerification, InMemoryAuditTrail, Period};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Semblance — mediated, attested, audited action gateway demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Semblance gateway demo",
    long_about = "Runs a batch of signed actions through the gateway pipeline,\n\
                  then prints the audit report and verifies the hash chain."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dispatch a demo batch and print the audit report.
    Run {
        /// Optional TOML file of allowlisted services; a built-in set is
        /// used when absent.
        #[arg(long)]
        allowlist: Option<PathBuf>,
    },

    /// Dispatch a demo batch and print only the chain-verification result.
    Verify {
        /// Optional TOML file of allowlisted services; a built-in set is
        /// used when absent.
        #[arg(long)]
        allowlist: Option<PathBuf>,
    },
}

// ── Built-in allowlist ────────────────────────────────────────────────────────

const DEFAULT_ALLOWLIST: &str = r#"
[[services]]
service_name = "mail"
domain = "mail.example.com"
protocol = "https"
added_by = "credential_setup"

[[services]]
service_name = "calendar"
domain = "calendar.example.com"
protocol = "https"
added_by = "credential_setup"

[[services]]
service_name = "search"
domain = "search.example.com"
protocol = "https"
"#;

// ── Mock adapter ──────────────────────────────────────────────────────────────

/// Stands in for the out-of-scope service adapters: mail and calendar
/// succeed, search is rate limited, payment fails downstream.
struct DemoAdapter;

impl ActionAdapter for DemoAdapter {
    fn call(&self, action: &ActionType, _payload: &serde_json::Value) -> AdapterOutcome {
        match action.service() {
            "mail" | "email" | "calendar" => AdapterOutcome::Success(json!({ "ok": true })),
            "search" => AdapterOutcome::RateLimited,
            _ => AdapterOutcome::Error("downstream returned 500".to_string()),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging. Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { allowlist } => run(allowlist),
        Command::Verify { allowlist } => verify(allowlist),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Gateway wiring ────────────────────────────────────────────────────────────

struct Gateway {
    dispatcher: Dispatcher,
    trail: InMemoryAuditTrail,
    signer: HmacAttestor,
    enrolled: usize,
}

fn build_gateway(allowlist_path: Option<PathBuf>) -> GatewayResult<Gateway> {
    let secret = b"demo-per-install-secret".to_vec();

    let trail = InMemoryAuditTrail::new();
    let allowlist = Allowlist::new();
    let config = match allowlist_path {
        Some(path) => AllowlistConfig::from_file(&path)?,
        None => AllowlistConfig::from_toml_str(DEFAULT_ALLOWLIST)?,
    };
    let enrolled = config.seed(&allowlist)?;
    info!(enrolled, "allowlist seeded");

    let dispatcher = Dispatcher::new(
        Arc::new(trail.clone()),
        Arc::new(allowlist),
        Box::new(HmacAttestor::new(secret.clone(), "core-device")),
        Box::new(HmacAttestor::new(secret.clone(), "gateway")),
        Arc::new(DemoAdapter),
        Duration::from_secs(5),
    );

    Ok(Gateway {
        dispatcher,
        trail,
        signer: HmacAttestor::new(secret, "core-device"),
        enrolled,
    })
}

/// Dispatch the demo batch, optionally echoing each outcome.
fn dispatch_batch(gateway: &Gateway, echo: bool) -> GatewayResult<()> {
    let batch: Vec<(ActionType, &str, serde_json::Value, u64)> = vec![
        (ActionType::EmailFetch, "mail.example.com", json!({ "folder": "inbox" }), 30),
        (ActionType::EmailSend, "mail.example.com", json!({ "to": "a@example.com" }), 60),
        (ActionType::CalendarCreate, "calendar.example.com", json!({ "title": "demo" }), 45),
        (ActionType::SearchQuery, "search.example.com", json!({ "q": "rust" }), 10),
        // Not enrolled: refused even though the signature is valid.
        (ActionType::PaymentSend, "pay.example.com", json!({ "amount": 5 }), 120),
    ];

    for (action, destination, payload, time_saved) in batch {
        let envelope = gateway.signer.sign(&payload)?;
        let outcome = gateway.dispatcher.dispatch(DispatchRequest {
            action: action.clone(),
            payload,
            destination: destination.to_string(),
            envelope,
            metadata: None,
            estimated_time_saved_seconds: time_saved,
        })?;

        if echo {
            println!(
                "  {:<18} -> {:<28} {:?}{}",
                action.to_string(),
                destination,
                outcome.status,
                outcome.error.map(|e| format!("  ({})", e)).unwrap_or_default()
            );
        }
    }
    Ok(())
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn run(allowlist_path: Option<PathBuf>) -> GatewayResult<()> {
    let gateway = build_gateway(allowlist_path)?;

    println!();
    println!("Semblance Gateway Demo");
    println!("======================");
    println!("{} destinations enrolled.", gateway.enrolled);
    println!();

    dispatch_batch(&gateway, true)?;
    print_report(&gateway.trail);
    Ok(())
}

fn verify(allowlist_path: Option<PathBuf>) -> GatewayResult<()> {
    let gateway = build_gateway(allowlist_path)?;
    dispatch_batch(&gateway, false)?;
    print_chain_check(&gateway.trail);
    Ok(())
}

// ── Reporting ─────────────────────────────────────────────────────────────────

fn print_report(trail: &InMemoryAuditTrail) {
    let query = AuditQuery::new(trail);

    println!();
    println!("Per-service report (today):");
    for group in query.aggregate_by_service(Period::Today) {
        println!(
            "  {:<10} runs={} ok={} failed={} time_saved={}s",
            group.service,
            group.request_count,
            group.success_count,
            group.error_count,
            group.time_saved_seconds
        );
    }

    println!();
    print_chain_check(trail);
}

fn print_chain_check(trail: &InMemoryAuditTrail) {
    println!("Ledger entries: {}", trail.count());
    match trail.verify_chain_integrity() {
        ChainVerification::Valid => println!("Audit chain: VALID"),
        ChainVerification::Broken { entry_id } => {
            println!("Audit chain: BROKEN at entry {}", entry_id)
        }
    }
    println!();
}
