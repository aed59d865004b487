use calibill::application::engine::ReconciliationEngine;
use calibill::config::{DEFAULT_TOLERANCE, EngineConfig};
use calibill::domain::ports::BillingServiceBox;
use calibill::domain::transaction::Transaction;
use calibill::error::BillingError;
use calibill::infrastructure::in_memory::InMemoryBillingService;
use calibill::interfaces::csv::instruction_reader::InstructionReader;
use calibill::interfaces::csv::statement_writer::StatementWriter;
use calibill::interfaces::json::snapshot_reader::SnapshotReader;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Transaction snapshot (JSON) as listed by the billing service
    snapshot: PathBuf,

    /// Payment instructions CSV file
    instructions: PathBuf,

    /// Path to persistent ledger (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Largest difference accepted between entered and expected amounts
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: Decimal,

    /// Minimum log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Logs go to stderr so stdout carries only the statement.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal())
                .with_target(true),
        )
        .init();
}

fn read_snapshot(path: &Path) -> Result<Vec<Transaction>> {
    let file = File::open(path).into_diagnostic()?;
    let reader = SnapshotReader::new(BufReader::new(file));

    let mut transactions = Vec::new();
    for record in reader.transactions().into_diagnostic()? {
        match record {
            Ok(tx) => transactions.push(tx),
            Err(e) => warn!(error = %e, "Skipping transaction record"),
        }
    }
    Ok(transactions)
}

#[cfg(feature = "storage-rocksdb")]
fn billing_service(
    db_path: Option<PathBuf>,
    snapshot: Vec<Transaction>,
) -> Result<BillingServiceBox> {
    use calibill::infrastructure::rocksdb::RocksDBBillingService;

    match db_path {
        Some(path) => {
            let service = RocksDBBillingService::open(&path).into_diagnostic()?;
            let added = service.seed(snapshot).into_diagnostic()?;
            info!(path = %path.display(), added, "Opened persistent ledger");
            Ok(Box::new(service))
        }
        None => Ok(Box::new(InMemoryBillingService::with_transactions(snapshot))),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn billing_service(
    db_path: Option<PathBuf>,
    snapshot: Vec<Transaction>,
) -> Result<BillingServiceBox> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory ledger."
        );
    }
    Ok(Box::new(InMemoryBillingService::with_transactions(snapshot)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let snapshot = read_snapshot(&cli.snapshot)?;
    info!(records = snapshot.len(), "Loaded transaction snapshot");

    let billing = billing_service(cli.db_path, snapshot)?;
    let engine = ReconciliationEngine::new(
        billing,
        EngineConfig::default().with_tolerance(cli.tolerance),
    );

    let file = File::open(cli.instructions).into_diagnostic()?;
    let reader = InstructionReader::new(file);
    for instruction in reader.instructions() {
        match instruction {
            Ok(instruction) => {
                let reference = instruction.reference.clone();
                match engine.process_instruction(instruction).await {
                    Ok(_) => {}
                    Err(e @ BillingError::PaymentUnreconciled { .. }) => {
                        warn!(%reference, error = %e, "Payment recorded but not reconciled");
                    }
                    Err(e) => {
                        warn!(%reference, error = %e, "Error processing payment");
                    }
                }
            }
            Err(e) => {
                warn!("Error reading payment instruction: {e}");
            }
        }
    }

    let transactions = engine.transactions().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = StatementWriter::new(stdout.lock());
    writer.write_statements(&transactions).into_diagnostic()?;

    Ok(())
}
