//! gov-cli — the governance kernel's operator binary.
//!
//! Subcommands:
//!   run     - boot a kernel against an evidence store and execute a batch
//!             of actions read from a JSON file
//!   keygen  - generate an ed25519 keypair for an entity or signer
//!   replay  - boot a kernel purely to run the Replay Engine and report the
//!             reconstructed state, without executing anything new

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use gov_core::types::{Action, ProtocolId, WallClockMs};
use gov_evidence::{EvidenceStore, InMemoryEvidenceStore};
use gov_kernel::Kernel;

#[derive(Parser, Debug)]
#[command(name = "gov-cli", version, about = "Governance kernel operator CLI")]
struct Args {
    /// Clock-skew tolerance override, in milliseconds (defaults to the
    /// kernel's built-in tolerance when unset).
    #[arg(long, global = true)]
    clock_skew_tolerance_ms: Option<i64>,

    /// Pressure-event threshold override (defaults to the kernel's built-in
    /// threshold when unset).
    #[arg(long, global = true)]
    pressure_threshold: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Boot a kernel and execute a batch of actions from a JSON file.
    Run {
        /// Path to the evidence-store directory (sled-backed). Omit to run
        /// against a fresh in-memory store (state does not survive exit).
        #[arg(long)]
        evidence_store: Option<PathBuf>,

        /// JSON file containing an array of actions to execute in order.
        #[arg(long)]
        actions: PathBuf,

        /// Budget ceiling passed to every commit in this batch.
        #[arg(long, default_value_t = 1_000)]
        budget: u64,
    },
    /// Generate an ed25519 keypair and print it as hex.
    Keygen,
    /// Boot a kernel purely to replay its evidence store and report the
    /// resulting state, without executing anything new.
    Replay {
        /// Path to the evidence-store directory (sled-backed).
        #[arg(long)]
        evidence_store: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,gov=debug".parse().unwrap()))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Keygen => run_keygen(),
        Command::Replay { evidence_store } => run_replay(evidence_store),
        Command::Run { evidence_store, actions, budget } => run_batch(evidence_store, actions, budget).await,
    }
}

fn run_keygen() -> anyhow::Result<()> {
    let keypair = gov_crypto::KeyPair::generate();
    println!("public_key: {}", keypair.public_key_hex());
    println!("# Treat the signing key as a secret; it is not printed here.");
    info!("keypair generated");
    Ok(())
}

fn open_store(path: Option<PathBuf>) -> anyhow::Result<Box<dyn EvidenceStore>> {
    match path {
        None => Ok(Box::new(InMemoryEvidenceStore::new())),
        Some(_path) => {
            #[cfg(feature = "sled-store")]
            {
                let store = gov_evidence::SledEvidenceStore::open(&_path).with_context(|| format!("opening evidence store at {}", _path.display()))?;
                Ok(Box::new(store))
            }
            #[cfg(not(feature = "sled-store"))]
            {
                anyhow::bail!("--evidence-store requires the sled-store feature (rebuild with --features sled-store)")
            }
        }
    }
}

fn run_replay(evidence_store: PathBuf) -> anyhow::Result<()> {
    let store = open_store(Some(evidence_store)).context("opening evidence store for replay")?;
    let kernel = Kernel::new(store);
    kernel.boot().context("replaying evidence chain")?;
    let snapshot_count = kernel.with_state_view(|v| v.snapshots().len());
    let integrity_ok = kernel.with_state_view(|v| v.verify_integrity());
    info!(snapshot_count, integrity_ok, "replay complete");
    println!("lifecycle: {:?}", kernel.lifecycle());
    println!("snapshots: {snapshot_count}");
    println!("state integrity: {integrity_ok}");
    Ok(())
}

async fn run_batch(evidence_store: Option<PathBuf>, actions_path: PathBuf, budget: u64) -> anyhow::Result<()> {
    let store = open_store(evidence_store).context("opening evidence store")?;
    let kernel = Kernel::new(store);
    kernel.boot().context("booting kernel")?;

    let json = std::fs::read_to_string(&actions_path).with_context(|| format!("reading actions from {}", actions_path.display()))?;
    let actions: Vec<Action> = serde_json::from_str(&json).context("parsing actions JSON")?;

    for action in actions {
        let now_ms: WallClockMs = action.timestamp.epoch as i64;
        let protocol_id: Option<ProtocolId> = action.payload.protocol_id.clone();
        match kernel.execute(action.clone(), protocol_id, budget, now_ms) {
            Ok(record) => info!(attempt_id = %record.attempt_id, status = ?record.status, "action committed"),
            Err(e) => tracing::warn!(action_id = %action.action_id, error = %e, "action failed"),
        }
    }

    Ok(())
}
