//! Vault path helpers.
//!
//! Vault paths are `/`-separated and relative to the vault root. The root
//! itself is the empty string.

/// Normalize a user- or host-supplied path into a vault path.
///
/// Backslashes become slashes, runs of slashes collapse, leading and trailing
/// slashes are dropped and non-breaking spaces become plain spaces. Both `""`
/// and `"/"` normalize to the root, `""`.
pub fn normalize_path(path: &str) -> String {
    let replaced: String = path
        .chars()
        .map(|c| match c {
            '\\' => '/',
            '\u{00A0}' | '\u{202F}' => ' ',
            other => other,
        })
        .collect();
    replaced
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Folder containing `path`; the root for top-level entries.
pub fn parent_folder(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment of `path`.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// `folder + "/" + name`, normalized.
pub fn join(folder: &str, name: &str) -> String {
    normalize_path(&format!("{folder}/{name}"))
}

/// Resolve `target` relative to `folder`, honouring `.` and `..` segments.
///
/// Returns `None` when `..` climbs above the vault root.
pub fn resolve_relative(folder: &str, target: &str) -> Option<String> {
    let mut segments: Vec<&str> = folder.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}
