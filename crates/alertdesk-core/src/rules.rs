// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule pattern compilation and input validation.

use regex::{Regex, RegexBuilder};

use crate::error::AlertdeskError;
use crate::types::{NewRule, RuleUpdate};

pub const RULE_NAME_MAX_CHARS: usize = 100;
pub const RULE_PATTERN_MAX_CHARS: usize = 200;

/// Compile a rule pattern. Matching is always case-insensitive.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn validate_name(name: &str) -> Result<(), AlertdeskError> {
    let len = name.chars().count();
    if len == 0 || len > RULE_NAME_MAX_CHARS {
        return Err(AlertdeskError::Validation(format!(
            "rule name must be 1-{RULE_NAME_MAX_CHARS} characters, got {len}"
        )));
    }
    Ok(())
}

fn validate_pattern(pattern: &str) -> Result<(), AlertdeskError> {
    let len = pattern.chars().count();
    if len == 0 || len > RULE_PATTERN_MAX_CHARS {
        return Err(AlertdeskError::Validation(format!(
            "rule pattern must be 1-{RULE_PATTERN_MAX_CHARS} characters, got {len}"
        )));
    }
    compile_pattern(pattern)
        .map_err(|e| AlertdeskError::Validation(format!("invalid regex pattern: {e}")))?;
    Ok(())
}

/// Validate a rule before it is stored.
pub fn validate_new_rule(rule: &NewRule) -> Result<(), AlertdeskError> {
    validate_name(&rule.name)?;
    validate_pattern(&rule.pattern)
}

/// Validate only the fields an update actually sets.
pub fn validate_rule_update(update: &RuleUpdate) -> Result<(), AlertdeskError> {
    if let Some(name) = &update.name {
        validate_name(name)?;
    }
    if let Some(pattern) = &update.pattern {
        validate_pattern(pattern)?;
    }
    Ok(())
}

/// Check a Slack channel ID against `^C[A-Z0-9]+$`.
pub fn validate_slack_channel_id(id: &str) -> Result<(), AlertdeskError> {
    let mut chars = id.chars();
    let valid = chars.next() == Some('C')
        && id.len() > 1
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(AlertdeskError::Validation(format!(
            "invalid Slack channel ID '{id}': expected C followed by uppercase letters or digits"
        )))
    }
}
