//! # contract: the seams between the ingestion core and its host
//!
//! The orchestrator never talks to a filesystem, a plugin registry or a UI
//! directly. It sees only the traits below, each annotated for `mockall` so
//! tests can swap in deterministic doubles.
//!
//! ## Traits
//! - [`Vault`]: the document store (lookup, enumerate, read, create, modify, rename)
//! - [`LinkIndex`]: resolved links of every document
//! - [`FileList`]: the seen-set of already ingested binaries
//! - [`EngineProvider`] / [`TemplateEngine`]: the optional external templating capability
//! - [`Notifier`]: fire-and-forget user-visible messages
//!
//! ## Paths
//! Every path crossing these traits is a vault path: `/`-separated, relative
//! to the vault root, without leading or trailing slash (see [`crate::paths`]).

#![allow(unused)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use mockall::{automock, predicate::*};

use crate::error::{EngineError, FileListError, VaultError};
use crate::paths;

/// A regular file in the vault, as observed when the event fired.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultFile {
    /// Full vault path, e.g. `Inbox/photo.png`.
    pub path: String,
    /// Last path segment, e.g. `photo.png`.
    pub name: String,
    /// Name without its extension, e.g. `photo`.
    pub basename: String,
    /// Extension without the dot, e.g. `png`. Empty when the name has none.
    pub extension: String,
    pub created: DateTime<Local>,
}

impl VaultFile {
    pub fn new(path: impl Into<String>, created: DateTime<Local>) -> Self {
        let path = paths::normalize_path(&path.into());
        let name = paths::file_name(&path).to_string();
        let (basename, extension) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), ext.to_string()),
            _ => (name.clone(), String::new()),
        };
        Self {
            path,
            name,
            basename,
            extension,
            created,
        }
    }
}

/// Result of resolving a path in the vault.
#[derive(Debug, Clone, PartialEq)]
pub enum VaultEntry {
    File(VaultFile),
    Folder { path: String },
}

impl VaultEntry {
    pub fn path(&self) -> &str {
        match self {
            VaultEntry::File(file) => &file.path,
            VaultEntry::Folder { path } => path,
        }
    }

    pub fn as_file(&self) -> Option<&VaultFile> {
        match self {
            VaultEntry::File(file) => Some(file),
            VaultEntry::Folder { .. } => None,
        }
    }
}

/// Source document path -> set of vault paths it links to.
pub type LinkGraph = BTreeMap<String, BTreeSet<String>>;

/// Hierarchical document store holding notes and binaries.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Vault: Send + Sync {
    /// Resolve a path to an existing entry, if any.
    async fn lookup(&self, path: &str) -> Option<VaultEntry>;

    /// Every regular file in the store, in the store's enumeration order.
    async fn list_files(&self) -> Result<Vec<VaultFile>, VaultError>;

    /// Full text content of a file.
    async fn read(&self, path: &str) -> Result<String, VaultError>;

    /// Create a new file. Fails if anything already exists at `path`.
    async fn create(&self, path: &str, content: &str) -> Result<(), VaultError>;

    /// Overwrite the content of an existing file.
    async fn modify(&self, path: &str, content: &str) -> Result<(), VaultError>;

    /// Move an entry. Fails if anything already exists at `to`.
    async fn rename(&self, from: &str, to: &str) -> Result<(), VaultError>;
}

/// Read-only view of the host's resolved link graph.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait LinkIndex: Send + Sync {
    async fn resolved_links(&self) -> Result<LinkGraph, VaultError>;
}

/// Seen-set recording which raw files were already ingested.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait FileList: Send + Sync {
    async fn has(&self, path: &str) -> bool;

    async fn add(&self, path: &str) -> Result<(), FileListError>;
}

/// Render mode handed to the external engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Render the whole template once into the target document.
    DynamicProcessor,
}

impl RunMode {
    /// Numeric code understood by the engine.
    pub fn code(self) -> u8 {
        match self {
            RunMode::DynamicProcessor => 4,
        }
    }
}

/// What the engine renders into, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationDescriptor {
    pub target_file: String,
    pub run_mode: RunMode,
}

/// An external templating capability.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// Render `template` for `invocation.target_file` and return the result.
    async fn parse_template(
        &self,
        invocation: InvocationDescriptor,
        template: &str,
    ) -> Result<String, EngineError>;
}

/// Host registry that may or may not currently hold a named engine.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait EngineProvider: Send + Sync {
    async fn try_acquire(&self, name: &str) -> Option<Arc<dyn TemplateEngine>>;
}

/// How loudly a notification is surfaced. The core only reports problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Sink for transient user-visible messages.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}
