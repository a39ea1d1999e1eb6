//! Link graph built by scanning the markdown notes of a [`Vault`].
//!
//! Recognised link forms:
//! - wikilinks: `[[target]]`, `![[target]]`, `[[target|alias]]`, `[[target#heading]]`
//! - markdown links: `[text](target)`, `![alt](target "title")`
//!
//! Targets are resolved, in order, as an exact vault path, the same with
//! `.md` appended, a path relative to the linking note's folder, and finally
//! by file name anywhere in the vault (lexicographically first path wins when
//! several files share the name). External URLs and unresolved targets are
//! dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::contract::{LinkGraph, LinkIndex, Vault};
use crate::error::VaultError;
use crate::paths;

static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!?\[[^\]\n]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#)
        .expect("markdown link pattern is valid")
});

static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("scheme pattern is valid"));

pub struct MarkdownLinkIndex {
    vault: Arc<dyn Vault>,
}

impl MarkdownLinkIndex {
    pub fn new(vault: Arc<dyn Vault>) -> Self {
        Self { vault }
    }
}

#[async_trait]
impl LinkIndex for MarkdownLinkIndex {
    async fn resolved_links(&self) -> Result<LinkGraph, VaultError> {
        let files = self.vault.list_files().await?;
        let resolver = TargetResolver::new(files.iter().map(|f| f.path.as_str()));

        let mut graph = LinkGraph::new();
        for note in files.iter().filter(|f| f.extension.eq_ignore_ascii_case("md")) {
            let content = match self.vault.read(&note.path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(note = %note.path, error = ?e, "Skipping unreadable note");
                    continue;
                }
            };
            let destinations: BTreeSet<String> = extract_link_targets(&content)
                .iter()
                .filter_map(|target| resolver.resolve(&note.path, target))
                .collect();
            if !destinations.is_empty() {
                graph.insert(note.path.clone(), destinations);
            }
        }
        debug!(sources = graph.len(), "Built link graph");
        Ok(graph)
    }
}

/// Raw link targets in `content`, with aliases, headings and block refs removed.
pub fn extract_link_targets(content: &str) -> Vec<String> {
    let mut targets = Vec::new();

    let mut rest = content;
    while let Some(start) = rest.find("[[") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("]]") else {
            break;
        };
        let inner = &after[..end];
        if !inner.contains('\n') {
            let target = inner.split('|').next().unwrap_or_default();
            let target = strip_fragment(target).trim();
            if !target.is_empty() {
                targets.push(target.to_string());
            }
        }
        rest = &after[end + 2..];
    }

    for caps in MARKDOWN_LINK.captures_iter(content) {
        let raw = &caps[1];
        if URL_SCHEME.is_match(raw) {
            continue;
        }
        let decoded = urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        let target = strip_fragment(&decoded).trim();
        if !target.is_empty() {
            targets.push(target.to_string());
        }
    }

    targets
}

fn strip_fragment(target: &str) -> &str {
    match target.find(['#', '^']) {
        Some(idx) => &target[..idx],
        None => target,
    }
}

/// Resolves link targets against a fixed set of vault files.
pub struct TargetResolver {
    files: BTreeSet<String>,
    by_name: BTreeMap<String, Vec<String>>,
}

impl TargetResolver {
    pub fn new<'a>(file_paths: impl IntoIterator<Item = &'a str>) -> Self {
        let files: BTreeSet<String> = file_paths.into_iter().map(str::to_string).collect();
        let mut by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for path in &files {
            by_name
                .entry(paths::file_name(path).to_string())
                .or_default()
                .push(path.clone());
        }
        Self { files, by_name }
    }

    pub fn resolve(&self, source: &str, target: &str) -> Option<String> {
        let target = target.trim().replace('\\', "/");
        let exact = paths::normalize_path(&target);
        if exact.is_empty() {
            return None;
        }

        let mut candidates = vec![exact.clone(), format!("{exact}.md")];
        if let Some(relative) = paths::resolve_relative(paths::parent_folder(source), &target) {
            candidates.push(format!("{relative}.md"));
            candidates.push(relative);
        }
        if let Some(found) = candidates.into_iter().find(|c| self.files.contains(c)) {
            return Some(found);
        }

        let name = paths::file_name(&exact);
        self.by_name
            .get(name)
            .or_else(|| self.by_name.get(&format!("{name}.md")))
            .and_then(|matches| matches.first().cloned())
    }
}
