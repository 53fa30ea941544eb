use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use docshift::engine::migration::{MigrationContext, MigrationJournal, MigrationOutcome, Migrator};
use docshift::engine::runner::MigrationOptions;
use docshift::engine::store::MemoryStore;
use docshift::logging;
use docshift::migrations;
use docshift::shared::config::CONFIG;

#[derive(Parser)]
#[command(name = "docshift")]
#[command(about = "Bulk document migrations over a document store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply every pending migration in name order
    Up,
    /// Revert one migration and drop it from the journal
    Down { name: String },
    /// List registered migrations and when they were applied
    Status,
}

fn open_store(path: &Path) -> anyhow::Result<MemoryStore> {
    if path.exists() {
        Ok(MemoryStore::load_from_file(path)?)
    } else {
        warn!(path = %path.display(), "No document dump found, starting empty");
        Ok(MemoryStore::new())
    }
}

fn describe(name: &str, outcome: &MigrationOutcome) {
    match outcome {
        MigrationOutcome::Streamed(report) => info!(
            "{name}: {} scanned, {} applied, {} failed, {} transform errors{}",
            report.progress.total_scanned,
            report.progress.total_applied,
            report.progress.total_failed,
            report.progress.transform_failed,
            if report.cancelled { " (cancelled)" } else { "" }
        ),
        MigrationOutcome::Scripted(report) => info!(
            "{name}: {} matched, {} updated, {} noops, {} version conflicts",
            report.total, report.updated, report.noops, report.version_conflicts
        ),
        MigrationOutcome::Noop => info!("{name}: nothing to do"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&CONFIG.logging)?;

    let data_file = Path::new(&CONFIG.store.data_file);
    let store = Arc::new(open_store(data_file)?);
    migrations::register_scripts(&store);

    let options = MigrationOptions::from_settings(&CONFIG);
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after in-flight batches");
            signal_token.cancel();
        }
    });

    let journal = MigrationJournal::load(Path::new(&CONFIG.migrations.journal_file))?;
    let ctx = MigrationContext::new(store.clone(), options).with_cancellation(cancel);
    let mut migrator = Migrator::new(ctx, journal);
    migrations::register_all(&mut migrator);

    match cli.command {
        Command::Up => {
            let result = migrator.up_pending().await;
            store.save_to_file(data_file)?;
            for (name, outcome) in result? {
                describe(&name, &outcome);
            }
        }
        Command::Down { name } => {
            let outcome = migrator.down(&name).await?;
            describe(&name, &outcome);
        }
        Command::Status => {
            for status in migrator.status() {
                match status.applied_at {
                    Some(at) => println!("{:<40} applied {}", status.name, at.to_rfc3339()),
                    None => println!("{:<40} pending", status.name),
                }
            }
        }
    }

    Ok(())
}
