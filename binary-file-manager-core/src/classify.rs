//! Linked / unlinked classification of tracked binaries.
//!
//! Both queries take a fresh snapshot of the link graph and the file list on
//! every call; nothing is cached between calls.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::contract::{LinkGraph, LinkIndex, Vault, VaultFile};
use crate::error::VaultError;
use crate::extension::FileExtensionManager;

pub struct LinkClassifier {
    vault: Arc<dyn Vault>,
    links: Arc<dyn LinkIndex>,
    extensions: FileExtensionManager,
}

/// Tracked binaries split by whether any document links to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub linked: Vec<VaultFile>,
    pub unlinked: Vec<VaultFile>,
}

impl LinkClassifier {
    pub fn new(
        vault: Arc<dyn Vault>,
        links: Arc<dyn LinkIndex>,
        extensions: FileExtensionManager,
    ) -> Self {
        Self {
            vault,
            links,
            extensions,
        }
    }

    pub async fn find_unlinked_binaries(&self) -> Result<Vec<VaultFile>, VaultError> {
        Ok(self.classify().await?.unlinked)
    }

    pub async fn find_linked_binaries(&self) -> Result<Vec<VaultFile>, VaultError> {
        Ok(self.classify().await?.linked)
    }

    /// Partition every tracked binary in store order.
    pub async fn classify(&self) -> Result<Classification, VaultError> {
        let linked_paths = linked_paths(&self.links.resolved_links().await?);
        let files = self.vault.list_files().await?;

        let (linked, unlinked): (Vec<_>, Vec<_>) = files
            .into_iter()
            .filter(|file| self.extensions.verify(&file.path))
            .partition(|file| linked_paths.contains(&file.path));

        info!(
            linked = linked.len(),
            unlinked = unlinked.len(),
            "Classified binaries"
        );
        Ok(Classification { linked, unlinked })
    }
}

/// Union of every destination in the graph.
pub fn linked_paths(graph: &LinkGraph) -> BTreeSet<String> {
    graph.values().flatten().cloned().collect()
}
