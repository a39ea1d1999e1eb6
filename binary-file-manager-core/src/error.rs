//! Error types for the store, seen-set and template engine seams.
//!
//! None of these escape [`crate::generator::MetaDataGenerator`]: the
//! orchestrator turns them into notifications. They surface only from the
//! read-only scans and from the adapters' own constructors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("no entry at {0}")]
    NotFound(String),

    #[error("an entry already exists at {0}")]
    AlreadyExists(String),

    #[error("{0} is not a file")]
    NotAFile(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl VaultError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        VaultError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum FileListError {
    #[error("failed to access seen-list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seen-list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch template engine {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("template engine exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("template engine produced non UTF-8 output")]
    Output(#[from] std::string::FromUtf8Error),
}
