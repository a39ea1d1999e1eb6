use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_FILENAME_FORMAT: &str = "INFO_{{NAME}}_{{EXTENSION:UP}}";

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "svg", "webp", "mp3", "webm", "wav", "m4a", "ogg", "3gp",
    "flac", "mp4", "ogv", "mov", "mkv", "pdf",
];

/// User settings consumed by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Folder watched for new binaries. Only direct children are ingested.
    pub binary_file_path: String,
    /// Folder that receives the metadata notes.
    pub folder: String,
    /// Folder the binaries are moved into.
    pub attachments_file_path: String,
    /// Pattern for the metadata note name, `.md` is appended.
    pub filename_format: String,
    /// Template note; empty means the built-in template.
    pub template_path: String,
    /// Render through the external template engine when it is available.
    pub use_templater: bool,
    pub extensions: Vec<String>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            binary_file_path: String::new(),
            folder: String::new(),
            attachments_file_path: "Attachments".to_string(),
            filename_format: DEFAULT_FILENAME_FORMAT.to_string(),
            template_path: String::new(),
            use_templater: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ManagerSettings {
    pub fn trace_loaded(&self) {
        info!(
            binary_file_path = %self.binary_file_path,
            folder = %self.folder,
            attachments_file_path = %self.attachments_file_path,
            use_templater = self.use_templater,
            extensions_count = self.extensions.len(),
            "Loaded ManagerSettings"
        );
        debug!(?self, "ManagerSettings loaded (full debug)");
    }
}
