// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for alertdesk.
//!
//! TOML files are merged over compiled defaults, then `ALERTDESK_*`
//! environment variables are applied. Unknown keys are rejected and reported
//! as miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use alertdesk_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Slack API: {}", config.slack.api_base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AlertdeskConfig, LogConfig, RateLimitConfig, SlackConfig, StorageConfig};

/// Load configuration from the standard file hierarchy and validate it.
///
/// Figment errors are converted into diagnostics that point at the offending
/// file and key where possible.
pub fn load_and_validate() -> Result<AlertdeskConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources(None);
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<AlertdeskConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources(Some(path));
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<AlertdeskConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read the TOML files that may have contributed to a failed load, for span lookup.
fn collect_toml_sources(explicit: Option<&std::path::Path>) -> Vec<(String, String)> {
    let mut sources = Vec::new();

    if let Some(path) = explicit {
        if let Ok(content) = std::fs::read_to_string(path) {
            sources.push((path.display().to_string(), content));
        }
        return sources;
    }

    if let Ok(content) = std::fs::read_to_string(loader::LOCAL_CONFIG) {
        let path = std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG).display().to_string())
            .unwrap_or_else(|_| loader::LOCAL_CONFIG.to_string());
        sources.push((path, content));
    }

    if let Some(path) = loader::user_config_path()
        && let Ok(content) = std::fs::read_to_string(&path)
    {
        sources.push((path.display().to_string(), content));
    }

    let system_path = std::path::Path::new(loader::SYSTEM_CONFIG);
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}
