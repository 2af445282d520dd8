use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stevedore_dropins::{ReconcileConfig, ReconcileOutcome, Reconciler};

#[derive(Parser, Debug)]
#[command(
    name = "stevedore-dropins",
    about = "Reconcile dropped-in plugin packs into the runtime package registry"
)]
struct Args {
    /// Runtime home directory; the other paths default relative to it
    #[arg(long, value_name = "DIR")]
    home: PathBuf,

    /// Dropins directory to scan [default: <home>/dropins]
    #[arg(long, value_name = "DIR")]
    dropins: Option<PathBuf>,

    /// Registry file to update [default: <home>/configuration/packages.info]
    #[arg(long, value_name = "FILE")]
    registry: Option<PathBuf>,

    /// Snapshot left by the previous run [default: <home>/configuration/previous.info]
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Scratch directory for staging the rewrite [default: system temp dir]
    #[arg(long, value_name = "DIR")]
    scratch: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = Args::parse();
    let configuration = args.home.join("configuration");
    let config = ReconcileConfig {
        dropins_dir: args.dropins.unwrap_or_else(|| args.home.join("dropins")),
        registry_file: args
            .registry
            .unwrap_or_else(|| configuration.join("packages.info")),
        snapshot_file: args
            .snapshot
            .unwrap_or_else(|| configuration.join("previous.info")),
        scratch_dir: args.scratch.unwrap_or_else(std::env::temp_dir),
    };

    match Reconciler::new(config).run()? {
        ReconcileOutcome::Skipped => println!("registry unchanged"),
        ReconcileOutcome::Reconciled { entries } => {
            println!("registry rewritten with {entries} entries")
        }
    }
    Ok(())
}
