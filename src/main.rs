//! didwallet demo
//!
//! Two parties, personA and personB, each get a wallet and a DID, then
//! send each other one auth-crypted message.
//!
//! ## Usage
//!
//! ```bash
//! # Run against ~/.didwallet
//! didwallet-demo
//!
//! # Throwaway run with debug logs
//! didwallet-demo --in-memory -vv
//!
//! # Keep the wallets and write JSONL logs
//! didwallet-demo --storage-root ./wallets --keep-wallets --log-dir ./logs
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use didwallet_core::environment::client_home_path;
use didwallet_core::logging::JsonlLayer;
use didwallet_core::{
    DemoOrchestrator, DemoScenario, FailurePolicy, LocalWalletService, RuntimeConfig,
    ScenarioReport, StorageType,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Two-party DID wallet demo
#[derive(Parser, Debug)]
#[command(name = "didwallet-demo")]
#[command(version = "0.1.0")]
#[command(about = "Create two wallets and DIDs, exchange auth-crypted messages, clean up")]
struct Args {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory holding wallet files (default: ~/.didwallet)
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Crypto thread pool size passed to the wallet runtime
    #[arg(long, default_value_t = 2)]
    thread_pool_size: usize,

    /// Keep wallets in memory instead of on disk
    #[arg(long)]
    in_memory: bool,

    /// Do not delete the wallets at the end
    #[arg(long)]
    keep_wallets: bool,

    /// Stop at the first failed step
    #[arg(long)]
    abort_on_failure: bool,

    /// Also write JSONL logs under this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn setup_logging(verbosity: u8, log_dir: Option<&PathBuf>) -> Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Console logs go to stderr so stdout carries only the demo transcript
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let jsonl = match log_dir {
        Some(dir) => {
            let run = chrono::Local::now().format("run-%H%M%S").to_string();
            Some(JsonlLayer::new(dir, run)?)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(jsonl)
        .init();
    Ok(())
}

fn print_report(report: &ScenarioReport) {
    for step in &report.steps {
        println!("{}", step);
    }

    if !report.exchanges.is_empty() {
        println!();
        println!("----- Exchanges -----");
    }
    for exchange in &report.exchanges {
        println!("{} -> {}", exchange.from, exchange.to);
        println!("  plaintext:  {:?}", exchange.plaintext);
        println!("  ciphertext: {} bytes", exchange.ciphertext_len);
        match &exchange.decrypted {
            Some(text) if exchange.sender_verkey_matches => {
                println!("  decrypted:  {:?} (sender verified)", text)
            }
            Some(text) => println!("  decrypted:  {:?} (SENDER MISMATCH)", text),
            None => println!("  decrypted:  <failed>"),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose, args.log_dir.as_ref())?;

    let storage_root = args.storage_root.unwrap_or_else(client_home_path);
    let runtime = RuntimeConfig::with_pool_size(args.thread_pool_size);
    let service = LocalWalletService::new(&storage_root, runtime.clone())?;

    let mut scenario = DemoScenario::standard();
    scenario.runtime = runtime;
    if args.in_memory {
        scenario = scenario.with_storage(StorageType::Inmem);
    }
    if args.keep_wallets {
        scenario = scenario.keep_wallets();
    }
    if args.abort_on_failure {
        scenario = scenario.with_policy(FailurePolicy::Abort);
    }

    println!(
        "----- Start {} / {} demo -----",
        scenario.first.name, scenario.second.name
    );
    let report = DemoOrchestrator::new(&service).run(&scenario);
    print_report(&report);
    println!("----- End demo -----");
    println!(
        "{} steps: {} succeeded, {} failed{}",
        report.steps.len(),
        report.succeeded_count(),
        report.failed().len(),
        if report.aborted { ", aborted" } else { "" }
    );

    if report.aborted {
        anyhow::bail!("scenario aborted at the first failed step");
    }
    Ok(())
}
