//! Filesystem watcher feeding vault `create` events into the generator.
//!
//! Each arriving file is handled on its own task, so a slow ingestion (for
//! instance one waiting on the template engine) does not hold up the others.
//! The watcher runs until Ctrl-C; tasks already running are awaited before
//! it returns, so no ingestion stops between writing the note and moving
//! the binary.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use binary_file_manager_core::contract::Vault;
use binary_file_manager_core::generator::MetaDataGenerator;
use binary_file_manager_core::vault::FsVault;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Vault paths of the files an event brings into the vault.
///
/// Creations and the destination side of a move count as arrivals.
pub fn arrivals(vault: &FsVault, event: &Event) -> Vec<String> {
    let arrived = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    );
    if !arrived {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter_map(|path| vault.vault_path(path))
        .filter(|path| !path.is_empty())
        .collect()
}

pub async fn watch(vault: Arc<FsVault>, generator: Arc<MetaDataGenerator>) -> Result<()> {
    watch_until(vault, generator, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = ?e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Watch until `shutdown` resolves, then wait for in-flight ingestions.
pub async fn watch_until<F>(
    vault: Arc<FsVault>,
    generator: Arc<MetaDataGenerator>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })?;
    watcher.watch(vault.root(), RecursiveMode::Recursive)?;
    info!(root = %vault.root().display(), "Watching vault for new files");

    let mut tasks = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping watcher");
                break;
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
            received = rx.recv() => {
                let Some(res) = received else {
                    warn!("Watcher channel closed");
                    break;
                };
                match res {
                    Ok(event) => {
                        for path in arrivals(&vault, &event) {
                            tasks.spawn(ingest_arrival(vault.clone(), generator.clone(), path));
                        }
                    }
                    Err(e) => warn!(error = ?e, "Watcher reported an error"),
                }
            }
        }
    }

    drop(watcher);
    if !tasks.is_empty() {
        info!(in_flight = tasks.len(), "Waiting for running ingestions to finish");
    }
    while let Some(joined) = tasks.join_next().await {
        log_join(joined);
    }
    Ok(())
}

async fn ingest_arrival(vault: Arc<FsVault>, generator: Arc<MetaDataGenerator>, path: String) {
    let Some(entry) = vault.lookup(&path).await else {
        debug!(path = %path, "File vanished before ingestion");
        return;
    };
    if let Some(outcome) = generator.ingest(&entry).await {
        info!(path = %path, outcome = %outcome, "Processed new file");
    }
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = ?e, "Ingestion task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::path::PathBuf;

    #[test]
    fn creations_and_move_targets_are_arrivals() {
        let vault = FsVault::new("/vault");

        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/vault/Inbox/photo.png"));
        assert_eq!(arrivals(&vault, &created), vec!["Inbox/photo.png"]);

        let moved_in = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(PathBuf::from("/vault/Inbox/scan.pdf"));
        assert_eq!(arrivals(&vault, &moved_in), vec!["Inbox/scan.pdf"]);
    }

    #[test]
    fn other_events_and_foreign_paths_are_ignored() {
        let vault = FsVault::new("/vault");

        let written = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/vault/Inbox/photo.png"));
        assert!(arrivals(&vault, &written).is_empty());

        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/vault/Inbox/photo.png"));
        assert!(arrivals(&vault, &removed).is_empty());

        let outside = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/tmp/photo.png"))
            .add_path(PathBuf::from("/vault"));
        assert!(arrivals(&vault, &outside).is_empty());
    }
}
