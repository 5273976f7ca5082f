// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-driven level selection and incident type derivation.

use alertdesk_core::rules::compile_pattern;
use alertdesk_core::{ClassificationRule, IncidentType, Level};
use tracing::warn;

/// Highest-ranked level among enabled rules whose pattern matches `text`.
///
/// Returns `None` when no rule is enabled or none fires. Patterns that fail
/// to compile are logged and skipped. List order never affects the result.
pub fn classify_level(text: &str, rules: &[ClassificationRule]) -> Option<Level> {
    let mut best: Option<Level> = None;

    for rule in rules.iter().filter(|r| r.enabled) {
        let regex = match compile_pattern(&rule.pattern) {
            Ok(regex) => regex,
            Err(e) => {
                warn!(rule_id = %rule.id, pattern = %rule.pattern, error = %e, "skipping invalid rule pattern");
                continue;
            }
        };
        if regex.is_match(text) && best.is_none_or(|b| rule.value.rank() > b.rank()) {
            best = Some(rule.value);
        }
    }

    best
}

/// Derive the incident type from urgency and impact.
///
/// | urgency      | impact | type     |
/// |--------------|--------|----------|
/// | none         | none   | none     |
/// | high, medium | any    | `障害`   |
/// | any          | high   | `障害`   |
/// | otherwise    |        | `不具合` |
pub fn determine_incident_type(
    urgency: Option<Level>,
    impact: Option<Level>,
) -> Option<IncidentType> {
    if urgency.is_none() && impact.is_none() {
        return None;
    }
    if matches!(urgency, Some(Level::High | Level::Medium)) || impact == Some(Level::High) {
        Some(IncidentType::Outage)
    } else {
        Some(IncidentType::Bug)
    }
}
