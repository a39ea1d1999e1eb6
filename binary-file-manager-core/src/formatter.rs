//! Placeholder expansion for filename patterns and note templates.
//!
//! | Placeholder          | Expands to                                  |
//! |----------------------|---------------------------------------------|
//! | `{{PATH}}`           | the path argument                           |
//! | `{{FULLNAME}}`       | last path segment                           |
//! | `{{NAME}}`           | last path segment without its extension     |
//! | `{{EXTENSION}}`      | extension as written                        |
//! | `{{EXTENSION:UP}}`   | extension, upper case                       |
//! | `{{EXTENSION:LOW}}`  | extension, lower case                       |
//! | `{{CDATE:<fmt>}}`    | creation time in a moment-style date format |
//! | `{{NOW:<fmt>}}`      | current time in a moment-style date format  |
//!
//! Anything else, including known names with an unknown argument, is left
//! untouched. Expansion is a single pass: text inserted by one placeholder is
//! never expanded again.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::paths;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{([A-Z]+)(?::([^}\n\r]*))?\}\}").expect("placeholder pattern is valid")
});

/// Moment tokens, longest first so `YYYY` wins over `YY`.
const MOMENT_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("MMMM", "%B"),
    ("dddd", "%A"),
    ("MMM", "%b"),
    ("ddd", "%a"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("M", "%-m"),
    ("D", "%-d"),
    ("H", "%-H"),
    ("h", "%-I"),
    ("m", "%-M"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter;

impl Formatter {
    pub fn new() -> Self {
        Self
    }

    /// Expand every recognised placeholder in `input` for the file at `path`.
    pub fn format(&self, input: &str, path: &str, created: DateTime<Local>) -> String {
        self.format_at(input, path, created, Local::now())
    }

    /// [`Formatter::format`] with an explicit "now" for `{{NOW:...}}`.
    pub fn format_at(
        &self,
        input: &str,
        path: &str,
        created: DateTime<Local>,
        now: DateTime<Local>,
    ) -> String {
        let full_name = paths::file_name(path);
        let (name, extension) = match full_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => (full_name, ""),
        };

        PLACEHOLDER
            .replace_all(input, |caps: &Captures<'_>| {
                let arg = caps.get(2).map(|m| m.as_str());
                let expanded = match (&caps[1], arg) {
                    ("PATH", None) => Some(path.to_string()),
                    ("FULLNAME", None) => Some(full_name.to_string()),
                    ("NAME", None) => Some(name.to_string()),
                    ("EXTENSION", None) => Some(extension.to_string()),
                    ("EXTENSION", Some("UP")) => Some(extension.to_uppercase()),
                    ("EXTENSION", Some("LOW")) => Some(extension.to_lowercase()),
                    ("CDATE", Some(pattern)) => Some(format_moment(created, pattern)),
                    ("NOW", Some(pattern)) => Some(format_moment(now, pattern)),
                    _ => None,
                };
                expanded.unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Format `time` with a moment-style pattern such as `YYYY-MM-DD-hh-mm-ss`.
pub fn format_moment(time: DateTime<Local>, pattern: &str) -> String {
    time.format(&moment_to_strftime(pattern)).to_string()
}

/// Translate moment tokens into a chrono `strftime` string.
///
/// `[...]` is copied literally, `%` is escaped, unknown letters pass through.
pub fn moment_to_strftime(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end].replace('%', "%%"));
                rest = &rest[end + 1..];
                continue;
            }
        }
        for (token, spec) in MOMENT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}
