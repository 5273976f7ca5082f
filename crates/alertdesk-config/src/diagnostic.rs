// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Converts Figment errors into miette diagnostics.
//!
//! Unknown keys get a "did you mean" hint based on Jaro-Winkler similarity and,
//! when the key can be located in a source file, a labelled span.

#![allow(unused_assignments)] // miette's Diagnostic derive triggers this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler score for a key to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, renderable by miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(alertdesk::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, if any is similar enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted in this section.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(alertdesk::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(alertdesk::config::missing_key),
        help("add `{key} = <value>` to alertdesk.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but is semantically invalid.
    #[error("validation error: {message}")]
    #[diagnostic(code(alertdesk::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(alertdesk::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Turn every error inside a `figment::Error` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, toml_sources))
        .collect()
}

fn convert(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let located = locate(error, toml_sources, &section, field);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span: located.as_ref().map(|(span, _)| *span),
                src: located.map(|(_, src)| src),
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.to_string(),
        },
        Kind::InvalidType(actual, expected) => {
            let (parent, leaf) = match section.split_last() {
                Some((leaf, parent)) => (parent.to_vec(), leaf.clone()),
                None => (Vec::new(), String::new()),
            };
            let located = if leaf.is_empty() {
                None
            } else {
                locate(error, toml_sources, &parent, &leaf)
            };
            ConfigError::InvalidType {
                key: section.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
                span: located.as_ref().map(|(span, _)| *span),
                src: located.map(|(_, src)| src),
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Find the file an error came from and the key's position within it.
fn locate(
    error: &figment::Error,
    toml_sources: &[(String, String)],
    section: &[String],
    key: &str,
) -> Option<(SourceSpan, NamedSource<String>)> {
    let (path, content) = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(file)) => {
            let file = file.display().to_string();
            toml_sources.iter().find(|(p, _)| *p == file)?
        }
        // Inline strings carry no file path; use the single inline source if present.
        _ => toml_sources.iter().find(|(p, _)| p == "<inline>")?,
    };
    let offset = find_key_offset(content, section, key)?;
    Some((
        SourceSpan::new(offset.into(), key.len()),
        NamedSource::new(path, content.clone()),
    ))
}

/// Byte offset of `key` inside the `[section]` table of `content`.
///
/// The search starts after the `[section]` header (or at the top of the file
/// for an empty section path) and stops at the next table header.
pub fn find_key_offset(content: &str, section: &[String], key: &str) -> Option<usize> {
    let mut in_section = section.is_empty();
    let header = section.first().map(|s| format!("[{s}]"));
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            in_section = header.as_deref() == Some(trimmed.trim_end());
        } else if in_section
            && let Some(rest) = trimmed.strip_prefix(key)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best-scoring valid key above [`SUGGESTION_THRESHOLD`], if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|k| (strsim::jaro_winkler(unknown, k), *k))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, k)| k.to_string())
}

/// Print each error to stderr with miette's graphical renderer.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_page_limit_for_typo() {
        let valid = &["bot_token", "api_base_url", "page_limit", "request_timeout_secs"];
        assert_eq!(suggest_key("page_limt", valid), Some("page_limit".to_string()));
    }

    #[test]
    fn no_suggestion_for_unrelated_key() {
        let valid = &["max_requests", "window_ms", "max_retries"];
        assert_eq!(suggest_key("qqqq", valid), None);
    }

    #[test]
    fn finds_key_in_named_section_only() {
        let content = "[log]\nlevel = \"info\"\n\n[slack]\nlevel = 3\n";
        let offset = find_key_offset(content, &["slack".to_string()], "level").unwrap();
        assert_eq!(&content[offset..offset + 5], "level");
        assert!(offset > content.find("[slack]").unwrap());
    }

    #[test]
    fn key_prefix_does_not_match_longer_key() {
        let content = "[rate_limit]\nmax_requests_x = 1\nmax_requests = 2\n";
        let offset = find_key_offset(content, &["rate_limit".to_string()], "max_requests").unwrap();
        assert_eq!(&content[offset..offset + 14], "max_requests =");
    }

    #[test]
    fn missing_section_yields_none() {
        let content = "[log]\nlevel = \"info\"\n";
        assert!(find_key_offset(content, &["storage".to_string()], "level").is_none());
    }
}
