//! Seen-set persisted as a JSON array of vault paths.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::contract::FileList;
use crate::error::FileListError;

#[derive(Debug)]
pub struct JsonFileList {
    path: PathBuf,
    files: RwLock<BTreeSet<String>>,
}

impl JsonFileList {
    /// Load the list stored at `path`; a missing file is an empty list.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, FileListError> {
        let path = path.into();
        let files = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<BTreeSet<String>>(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(source) => {
                return Err(FileListError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        info!(path = %path.display(), entries = files.len(), "Loaded seen-list");
        Ok(Self {
            path,
            files: RwLock::new(files),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    async fn save(&self, files: &BTreeSet<String>) -> Result<(), FileListError> {
        let io_err = |source| FileListError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(files)?;
        tokio::fs::write(&self.path, body).await.map_err(io_err)?;
        debug!(path = %self.path.display(), entries = files.len(), "Saved seen-list");
        Ok(())
    }
}

#[async_trait]
impl FileList for JsonFileList {
    async fn has(&self, path: &str) -> bool {
        self.files.read().await.contains(path)
    }

    async fn add(&self, path: &str) -> Result<(), FileListError> {
        let mut files = self.files.write().await;
        if !files.insert(path.to_string()) {
            return Ok(());
        }
        if let Err(e) = self.save(&files).await {
            files.remove(path);
            return Err(e);
        }
        Ok(())
    }
}
