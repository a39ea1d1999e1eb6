//! [`Vault`] over a directory on the local filesystem.
//!
//! Vault paths map onto `root/<path>`. Dot-directories (`.obsidian`, `.git`,
//! the seen-list folder) are invisible to enumeration.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::contract::{Vault, VaultEntry, VaultFile};
use crate::error::VaultError;
use crate::paths;

#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a vault path.
    pub fn absolute(&self, path: &str) -> PathBuf {
        let normalized = paths::normalize_path(path);
        if normalized.is_empty() {
            self.root.clone()
        } else {
            self.root.join(normalized)
        }
    }

    /// Vault path of an absolute location under the root.
    pub fn vault_path(&self, absolute: &Path) -> Option<String> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }

    async fn ensure_parent(&self, path: &str) -> Result<(), VaultError> {
        let parent = paths::parent_folder(path);
        if parent.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(self.absolute(parent))
            .await
            .map_err(|e| VaultError::io(parent, e))
    }
}

fn created_at(meta: &std::fs::Metadata) -> DateTime<Local> {
    meta.created()
        .or_else(|_| meta.modified())
        .unwrap_or_else(|_| SystemTime::now())
        .into()
}

#[async_trait]
impl Vault for FsVault {
    async fn lookup(&self, path: &str) -> Option<VaultEntry> {
        let normalized = paths::normalize_path(path);
        let meta = fs::metadata(self.absolute(&normalized)).await.ok()?;
        if meta.is_dir() {
            Some(VaultEntry::Folder { path: normalized })
        } else if meta.is_file() {
            Some(VaultEntry::File(VaultFile::new(normalized, created_at(&meta))))
        } else {
            None
        }
    }

    async fn list_files(&self) -> Result<Vec<VaultFile>, VaultError> {
        let root = self.root.clone();
        let walked = tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            let walker = WalkDir::new(&root).into_iter().filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            });
            for entry in walker {
                let entry = entry.map_err(|e| {
                    let at = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string());
                    VaultError::io(at, e.into())
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let meta = entry
                    .metadata()
                    .map_err(|e| VaultError::io(entry.path().display().to_string(), e.into()))?;
                files.push((entry.into_path(), created_at(&meta)));
            }
            Ok::<_, VaultError>(files)
        })
        .await
        .map_err(|e| VaultError::io(self.root.display().to_string(), std::io::Error::other(e)))??;

        let mut files: Vec<VaultFile> = walked
            .into_iter()
            .filter_map(|(absolute, created)| {
                self.vault_path(&absolute)
                    .map(|path| VaultFile::new(path, created))
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %self.root.display(), files = files.len(), "Enumerated vault files");
        Ok(files)
    }

    async fn read(&self, path: &str) -> Result<String, VaultError> {
        fs::read_to_string(self.absolute(path))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => VaultError::NotFound(path.to_string()),
                _ => VaultError::io(path, e),
            })
    }

    async fn create(&self, path: &str, content: &str) -> Result<(), VaultError> {
        let path = paths::normalize_path(path);
        self.ensure_parent(&path).await?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.absolute(&path))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => VaultError::AlreadyExists(path.clone()),
                _ => VaultError::io(path.as_str(), e),
            })?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| VaultError::io(path.as_str(), e))?;
        file.flush().await.map_err(|e| VaultError::io(path.as_str(), e))?;
        info!(path = %path, bytes = content.len(), "Created file");
        Ok(())
    }

    async fn modify(&self, path: &str, content: &str) -> Result<(), VaultError> {
        match self.lookup(path).await {
            Some(VaultEntry::File(_)) => {}
            Some(VaultEntry::Folder { .. }) => return Err(VaultError::NotAFile(path.to_string())),
            None => return Err(VaultError::NotFound(path.to_string())),
        }
        fs::write(self.absolute(path), content)
            .await
            .map_err(|e| VaultError::io(path, e))?;
        debug!(path, bytes = content.len(), "Modified file");
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), VaultError> {
        if self.lookup(from).await.is_none() {
            return Err(VaultError::NotFound(from.to_string()));
        }
        if self.lookup(to).await.is_some() {
            return Err(VaultError::AlreadyExists(to.to_string()));
        }
        let to = paths::normalize_path(to);
        self.ensure_parent(&to).await?;
        fs::rename(self.absolute(from), self.absolute(&to))
            .await
            .map_err(|e| VaultError::io(from, e))?;
        info!(from, to = %to, "Renamed entry");
        Ok(())
    }
}
