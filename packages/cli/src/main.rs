use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use server::config::AppConfig;
use server::import;
use server::state::AppState;

/// Vault maintenance commands, run in-process against the
/// configured database and blob store.
#[derive(Parser)]
#[command(name = "vault", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a ZIP archive as a new collection.
    Import {
        /// Path to the ZIP file to import.
        zip_path: PathBuf,
        /// Owning principal recorded on the collection.
        #[arg(long)]
        owner: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Import { zip_path, owner } => import_command(zip_path, owner).await,
    }
}

async fn import_command(zip_path: PathBuf, owner: Option<String>) -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let state = AppState::init(config).await?;

    let archive_name = zip_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("archive.zip")
        .to_string();

    let source = File::open(&zip_path)
        .with_context(|| format!("cannot open {}", zip_path.display()))?;

    let outcome = match import::import_archive(
        &state.db,
        &*state.blob_store,
        source,
        &archive_name,
        owner.as_deref(),
        &state.config.notify.default_recipient,
        &state.config.import,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => bail!("import failed [{}]: {e}", e.kind()),
    };

    println!(
        "Imported collection '{}' ({}): files={}, skipped={}, bytes={}",
        outcome.collection_name,
        outcome.collection_slug,
        outcome.created_files,
        outcome.skipped_duplicates,
        outcome.total_bytes
    );
    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }

    Ok(())
}
