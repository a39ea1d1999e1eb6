//! Template lookup with a built-in fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::contract::{Notifier, Severity, Vault, VaultEntry};
use crate::retry::{retry_until_some, RetryPolicy};

pub const DEFAULT_TEMPLATE_CONTENT: &str = "![[{{PATH}}]]
LINK: [[{{PATH}}]]
CREATED At: {{CDATE:YYYY-MM-DD}}
FILE TYPE: {{EXTENSION:UP}}
";

pub struct TemplateResolver {
    vault: Arc<dyn Vault>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
}

impl TemplateResolver {
    pub fn new(vault: Arc<dyn Vault>, notifier: Arc<dyn Notifier>, retry: RetryPolicy) -> Self {
        Self {
            vault,
            notifier,
            retry,
        }
    }

    /// Text of the template at `template_path`, or the built-in template.
    ///
    /// An empty path never touches the store. Otherwise the lookup is retried
    /// while the store catches up; a path that stays missing, is a folder or
    /// cannot be read is reported and replaced by the default.
    pub async fn fetch_template_content(&self, template_path: &str) -> String {
        if template_path.is_empty() {
            return DEFAULT_TEMPLATE_CONTENT.to_string();
        }

        let vault = &self.vault;
        let entry = retry_until_some(move || vault.lookup(template_path), self.retry).await;

        let file = match entry {
            Some(VaultEntry::File(file)) => file,
            other => {
                warn!(template_path, found = ?other, "Template file is missing or not a file");
                return self.invalid_template(template_path);
            }
        };

        match self.vault.read(&file.path).await {
            Ok(content) => {
                debug!(template_path, bytes = content.len(), "Template loaded");
                content
            }
            Err(e) => {
                warn!(template_path, error = ?e, "Template file could not be read");
                self.invalid_template(template_path)
            }
        }
    }

    fn invalid_template(&self, template_path: &str) -> String {
        self.notifier.notify(
            Severity::Warning,
            &format!("Template file {template_path} is invalid"),
        );
        DEFAULT_TEMPLATE_CONTENT.to_string()
    }
}
