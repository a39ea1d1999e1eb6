//! Extension policy: which files count as tracked binaries.
//!
//! Extensions may overlap (`gz` and `tar.gz`), so there are two queries:
//! [`FileExtensionManager::extension_matched_best`] picks the most specific
//! (longest) configured extension a name ends with, and
//! [`FileExtensionManager::verify`] only asks whether any extension matches.
//! Matching is ASCII case-insensitive.

use crate::paths;

#[derive(Debug, Clone, Default)]
pub struct FileExtensionManager {
    extensions: Vec<String>,
}

impl FileExtensionManager {
    /// Build a policy from configured extensions, with or without a leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        extensions.sort();
        extensions.dedup();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// The longest configured extension that `file_name` ends with.
    pub fn extension_matched_best(&self, file_name: &str) -> Option<&str> {
        let lower = file_name.to_ascii_lowercase();
        self.extensions
            .iter()
            .filter(|ext| ends_with_extension(&lower, ext))
            .max_by_key(|ext| ext.len())
            .map(String::as_str)
    }

    /// Whether the file at `path` has any configured extension.
    pub fn verify(&self, path: &str) -> bool {
        let lower = paths::file_name(path).to_ascii_lowercase();
        self.extensions
            .iter()
            .any(|ext| ends_with_extension(&lower, ext))
    }
}

/// `name` ends with `.ext` and has a non-empty stem in front of it.
fn ends_with_extension(name: &str, ext: &str) -> bool {
    name.len() > ext.len() + 1
        && name.ends_with(ext)
        && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_match_prefers_most_specific_extension() {
        let policy = FileExtensionManager::new(["gz", "tar.gz", ".png"]);
        assert_eq!(policy.extension_matched_best("backup.tar.gz"), Some("tar.gz"));
        assert_eq!(policy.extension_matched_best("log.gz"), Some("gz"));
        assert_eq!(policy.extension_matched_best("Photo.PNG"), Some("png"));
        assert_eq!(policy.extension_matched_best("notes.md"), None);
    }

    #[test]
    fn extension_must_follow_a_dot_and_a_stem() {
        let policy = FileExtensionManager::new(["png"]);
        assert_eq!(policy.extension_matched_best("png"), None);
        assert_eq!(policy.extension_matched_best(".png"), None);
        assert_eq!(policy.extension_matched_best("xpng"), None);
    }

    #[test]
    fn verify_looks_at_last_segment_only() {
        let policy = FileExtensionManager::new(["pdf"]);
        assert!(policy.verify("papers/2024/report.pdf"));
        assert!(!policy.verify("papers.pdf/report.md"));
    }

    #[test]
    fn empty_policy_matches_nothing() {
        let policy = FileExtensionManager::new(Vec::<String>::new());
        assert!(!policy.verify("a.png"));
        assert_eq!(policy.extension_matched_best("a.png"), None);
    }
}
