///
/// This module implements the CLI interface for binary-file-manager: command
/// parsing, wiring of the core collaborators, and user-visible output.
///
/// All ingestion and classification logic lives in the
/// [`binary-file-manager-core`] crate. This module only builds the on-disk
/// implementations of its traits from the loaded config and routes
/// subcommands to them.
///
/// ## How To Use
/// - For command-line users: use the installed `binary-file-manager` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`binary-file-manager-core`]: ../../binary_file_manager_core/
use crate::load_config::{load_config, CliConfig};
use crate::watch::watch;
use anyhow::Result;
use binary_file_manager_core::classify::LinkClassifier;
use binary_file_manager_core::contract::{Vault, VaultFile};
use binary_file_manager_core::engine::PluginDirectory;
use binary_file_manager_core::extension::FileExtensionManager;
use binary_file_manager_core::file_list::JsonFileList;
use binary_file_manager_core::generator::{Collaborators, MetaDataGenerator};
use binary_file_manager_core::links::MarkdownLinkIndex;
use binary_file_manager_core::notice::TracingNotifier;
use binary_file_manager_core::vault::FsVault;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI for binary-file-manager: metadata notes for binaries dropped into a vault.
#[derive(Parser)]
#[clap(
    name = "binary-file-manager",
    version,
    about = "Create metadata notes for new binary files in a markdown vault and file them under attachments"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the vault and ingest binaries as they arrive
    Watch {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Ingest a single file, given as a vault path or a path inside the vault
    Ingest {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        path: PathBuf,
    },
    /// Ingest every eligible binary already in the source folder
    Scan {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// List tracked binaries no note links to
    Unlinked {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// List tracked binaries at least one note links to
    Linked {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Watch { config } => {
            let config = load_config(config)?;
            let vault = open_vault(&config)?;
            let generator = Arc::new(build_generator(&config, vault.clone()).await?);
            tracing::info!(command = "watch", "Starting watcher");
            watch(vault, generator).await
        }
        Commands::Ingest { config, path } => {
            let config = load_config(config)?;
            let vault = open_vault(&config)?;
            let generator = build_generator(&config, vault.clone()).await?;
            let vault_path = to_vault_path(&vault, &path)?;
            tracing::info!(command = "ingest", path = %vault_path, "Ingesting file");

            let entry = vault
                .lookup(&vault_path)
                .await
                .ok_or_else(|| anyhow::anyhow!("No file at {vault_path} in the vault"))?;
            match generator.ingest(&entry).await {
                Some(outcome) => println!("{vault_path}: {outcome}"),
                None => println!("{vault_path}: skipped, not an eligible new binary"),
            }
            Ok(())
        }
        Commands::Scan { config } => {
            let config = load_config(config)?;
            let vault = open_vault(&config)?;
            let generator = build_generator(&config, vault).await?;
            tracing::info!(command = "scan", "Ingesting existing files");

            let outcomes = generator
                .ingest_existing()
                .await
                .map_err(|e| anyhow::Error::msg(format!("Scan failed: {e}")))?;
            for outcome in &outcomes {
                println!("{outcome}");
            }
            println!("{} file(s) ingested", outcomes.len());
            Ok(())
        }
        Commands::Unlinked { config } => {
            let config = load_config(config)?;
            let classifier = build_classifier(&config)?;
            tracing::info!(command = "unlinked", "Listing unlinked binaries");
            print_files(&classifier.find_unlinked_binaries().await?);
            Ok(())
        }
        Commands::Linked { config } => {
            let config = load_config(config)?;
            let classifier = build_classifier(&config)?;
            tracing::info!(command = "linked", "Listing linked binaries");
            print_files(&classifier.find_linked_binaries().await?);
            Ok(())
        }
    }
}

fn open_vault(config: &CliConfig) -> Result<Arc<FsVault>> {
    let root = std::fs::canonicalize(&config.vault).map_err(|e| {
        tracing::error!(vault = ?config.vault, error = ?e, "Vault folder is not accessible");
        anyhow::anyhow!("Vault folder {:?} is not accessible: {e}", config.vault)
    })?;
    if !root.is_dir() {
        return Err(anyhow::anyhow!("Vault {:?} is not a folder", root));
    }
    Ok(Arc::new(FsVault::new(root)))
}

async fn build_generator(config: &CliConfig, vault: Arc<FsVault>) -> Result<MetaDataGenerator> {
    let file_list = JsonFileList::load(config.seen_list_path()).await?;
    let engines = PluginDirectory::new(config.plugins_path(), vault.root());
    Ok(MetaDataGenerator::new(
        config.settings.clone(),
        Collaborators {
            vault,
            file_list: Arc::new(file_list),
            engines: Arc::new(engines),
            notifier: Arc::new(TracingNotifier),
        },
        config.retry_policy(),
    ))
}

fn build_classifier(config: &CliConfig) -> Result<LinkClassifier> {
    let vault: Arc<dyn Vault> = open_vault(config)?;
    let links = Arc::new(MarkdownLinkIndex::new(vault.clone()));
    let extensions = FileExtensionManager::new(&config.settings.extensions);
    Ok(LinkClassifier::new(vault, links, extensions))
}

/// Accepts either a vault path or a filesystem path under the vault root.
fn to_vault_path(vault: &FsVault, path: &Path) -> Result<String> {
    if path.is_absolute() {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        return vault
            .vault_path(&canonical)
            .ok_or_else(|| anyhow::anyhow!("{:?} is outside the vault {:?}", path, vault.root()));
    }
    Ok(path.to_string_lossy().replace('\\', "/"))
}

fn print_files(files: &[VaultFile]) {
    for file in files {
        println!("{}", file.path);
    }
}
