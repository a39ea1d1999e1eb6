//! Ingestion orchestrator: metadata note creation and binary relocation.
//!
//! For each new binary in the source folder the generator
//!   - checks eligibility ([`MetaDataGenerator::should_create_metadata_file`])
//!   - derives a collision-free metadata note path from the filename pattern
//!   - resolves the template and, when enabled, the external engine
//!   - computes the binary's final attachment path before writing anything
//!   - writes the note (directly, or through the engine) and moves the binary
//!
//! # Error Handling
//! Nothing propagates out of [`MetaDataGenerator::create`] or
//! [`MetaDataGenerator::ingest`]. Every failure ends in a fallback or a
//! notification, and is reflected in the returned [`IngestionOutcome`].
//! A note written before a failed move or a failed render is left in place.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::contract::{
    EngineProvider, FileList, InvocationDescriptor, Notifier, RunMode, Severity, TemplateEngine,
    Vault, VaultEntry, VaultFile,
};
use crate::engine::ExternalEngineLocator;
use crate::error::VaultError;
use crate::extension::FileExtensionManager;
use crate::formatter::Formatter;
use crate::paths;
use crate::retry::RetryPolicy;
use crate::settings::ManagerSettings;
use crate::template::TemplateResolver;
use crate::uniquify::uniquify;

pub const ENGINE_FAILURE_NOTICE: &str = "ERROR in Binary File Manager: failed to connect to the template engine. Your engine version may not be supported";

/// Host collaborators injected into the generator.
#[derive(Clone)]
pub struct Collaborators {
    pub vault: Arc<dyn Vault>,
    pub file_list: Arc<dyn FileList>,
    pub engines: Arc<dyn EngineProvider>,
    pub notifier: Arc<dyn Notifier>,
}

/// What one `create` call left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    /// Note written and binary moved.
    Completed {
        metadata_path: String,
        attachment_path: String,
    },
    /// Note written, but the binary is still at its original path.
    RelocationFailed {
        metadata_path: String,
        attachment_path: String,
    },
    /// Empty note written, engine render failed, binary not moved.
    RenderFailed { metadata_path: String },
    /// The note could not be created; nothing changed.
    Abandoned,
}

impl IngestionOutcome {
    /// A metadata note exists for the binary.
    pub fn wrote_metadata(&self) -> bool {
        !matches!(self, IngestionOutcome::Abandoned)
    }
}

impl fmt::Display for IngestionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionOutcome::Completed {
                metadata_path,
                attachment_path,
            } => write!(f, "created {metadata_path}, moved binary to {attachment_path}"),
            IngestionOutcome::RelocationFailed {
                metadata_path,
                attachment_path,
            } => write!(
                f,
                "created {metadata_path}, binary could not be moved to {attachment_path}"
            ),
            IngestionOutcome::RenderFailed { metadata_path } => {
                write!(f, "created empty {metadata_path}, template engine failed")
            }
            IngestionOutcome::Abandoned => write!(f, "metadata note could not be created"),
        }
    }
}

pub struct MetaDataGenerator {
    settings: ManagerSettings,
    vault: Arc<dyn Vault>,
    file_list: Arc<dyn FileList>,
    notifier: Arc<dyn Notifier>,
    formatter: Formatter,
    extensions: FileExtensionManager,
    templates: TemplateResolver,
    engines: ExternalEngineLocator,
}

impl MetaDataGenerator {
    pub fn new(settings: ManagerSettings, deps: Collaborators, retry: RetryPolicy) -> Self {
        let extensions = FileExtensionManager::new(&settings.extensions);
        Self {
            templates: TemplateResolver::new(deps.vault.clone(), deps.notifier.clone(), retry),
            engines: ExternalEngineLocator::new(deps.engines, retry),
            vault: deps.vault,
            file_list: deps.file_list,
            notifier: deps.notifier,
            formatter: Formatter::new(),
            extensions,
            settings,
        }
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn extensions(&self) -> &FileExtensionManager {
        &self.extensions
    }

    /// Whether `entry` is a new binary that should get a metadata note.
    pub async fn should_create_metadata_file(&self, entry: &VaultEntry) -> bool {
        let VaultEntry::File(file) = entry else {
            return false;
        };

        let folder = paths::normalize_path(paths::parent_folder(&file.path));
        if folder != paths::normalize_path(&self.settings.binary_file_path) {
            return false;
        }

        if self.extensions.extension_matched_best(&file.name).is_none() {
            return false;
        }

        !self.file_list.has(&file.path).await
    }

    /// Run the full ingestion sequence for an eligible binary.
    pub async fn create(&self, file: &VaultFile) -> IngestionOutcome {
        let metadata_name = self.generate_metadata_file_name(file);
        let metadata_name = uniquify(self.vault.as_ref(), &metadata_name, &self.settings.folder).await;
        let metadata_path = paths::join(&self.settings.folder, &metadata_name);
        info!(binary = %file.path, metadata = %metadata_path, "Creating metadata file");

        self.create_metadata_file(&metadata_path, file).await
    }

    /// Eligibility check, creation, and seen-set bookkeeping in one step.
    ///
    /// Returns `None` when the entry was not eligible.
    pub async fn ingest(&self, entry: &VaultEntry) -> Option<IngestionOutcome> {
        if !self.should_create_metadata_file(entry).await {
            return None;
        }
        let file = entry.as_file()?;

        let outcome = self.create(file).await;
        if outcome.wrote_metadata() {
            if let Err(e) = self.file_list.add(&file.path).await {
                error!(binary = %file.path, error = ?e, "Failed to record ingested file");
                self.notifier.notify(
                    Severity::Error,
                    &format!("Failed to record {} as processed: {e}", file.path),
                );
            }
        }
        info!(binary = %file.path, outcome = ?outcome, "Ingestion finished");
        Some(outcome)
    }

    /// Ingest every eligible file already sitting in the vault, one by one.
    pub async fn ingest_existing(&self) -> Result<Vec<IngestionOutcome>, VaultError> {
        let files = self.vault.list_files().await?;
        let mut outcomes = Vec::new();
        for file in files {
            if let Some(outcome) = self.ingest(&VaultEntry::File(file)).await {
                outcomes.push(outcome);
            }
        }
        info!(ingested = outcomes.len(), "Processed existing files");
        Ok(outcomes)
    }

    fn generate_metadata_file_name(&self, file: &VaultFile) -> String {
        format!(
            "{}.md",
            self.formatter
                .format(&self.settings.filename_format, &file.path, file.created)
        )
    }

    async fn create_metadata_file(&self, metadata_path: &str, binary: &VaultFile) -> IngestionOutcome {
        let template = self
            .templates
            .fetch_template_content(&self.settings.template_path)
            .await;

        let engine = if self.settings.use_templater {
            self.engines.get_templater_plugin().await
        } else {
            None
        };

        let attachments = &self.settings.attachments_file_path;
        let attachment_name = uniquify(self.vault.as_ref(), &binary.name, attachments).await;
        let attachment_path = paths::join(attachments, &attachment_name);
        let content = self
            .formatter
            .format(&template, &attachment_path, binary.created);

        match engine {
            None => {
                if let Err(e) = self.vault.create(metadata_path, &content).await {
                    return self.abandon(metadata_path, e);
                }
            }
            Some(engine) => {
                if let Err(e) = self.vault.create(metadata_path, "").await {
                    return self.abandon(metadata_path, e);
                }
                if !self.render_with_engine(engine.as_ref(), metadata_path, &content).await {
                    return IngestionOutcome::RenderFailed {
                        metadata_path: metadata_path.to_string(),
                    };
                }
            }
        }

        if self.relocate(binary, &attachment_path).await {
            IngestionOutcome::Completed {
                metadata_path: metadata_path.to_string(),
                attachment_path,
            }
        } else {
            IngestionOutcome::RelocationFailed {
                metadata_path: metadata_path.to_string(),
                attachment_path,
            }
        }
    }

    async fn render_with_engine(
        &self,
        engine: &dyn TemplateEngine,
        metadata_path: &str,
        content: &str,
    ) -> bool {
        let invocation = InvocationDescriptor {
            target_file: metadata_path.to_string(),
            run_mode: RunMode::DynamicProcessor,
        };
        let rendered = match engine.parse_template(invocation, content).await {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(metadata = %metadata_path, error = ?e, "Template engine render failed");
                self.notifier.notify(Severity::Warning, ENGINE_FAILURE_NOTICE);
                return false;
            }
        };

        match self.vault.modify(metadata_path, &rendered).await {
            Ok(()) => true,
            Err(e) => {
                error!(metadata = %metadata_path, error = ?e, "Failed to write rendered metadata");
                self.notifier.notify(
                    Severity::Error,
                    &format!("Failed to write rendered metadata to {metadata_path}: {e}"),
                );
                false
            }
        }
    }

    async fn relocate(&self, binary: &VaultFile, attachment_path: &str) -> bool {
        match self.vault.rename(&binary.path, attachment_path).await {
            Ok(()) => {
                info!(from = %binary.path, to = %attachment_path, "Moved binary into attachments");
                true
            }
            Err(e) => {
                error!(from = %binary.path, to = %attachment_path, error = ?e, "Failed to move binary");
                self.notifier.notify(
                    Severity::Error,
                    &format!("Failed to move {} to {attachment_path}: {e}", binary.path),
                );
                false
            }
        }
    }

    fn abandon(&self, metadata_path: &str, e: VaultError) -> IngestionOutcome {
        error!(metadata = %metadata_path, error = ?e, "Failed to create metadata file");
        self.notifier.notify(
            Severity::Error,
            &format!("Failed to create metadata file {metadata_path}: {e}"),
        );
        IngestionOutcome::Abandoned
    }
}
