// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword heuristics with fixed pattern lists.
//!
//! Unlike [`crate::rules`], these never return "unclassified": text that
//! matches nothing, including empty text, is `Low`.

use std::sync::LazyLock;

use alertdesk_core::rules::compile_pattern;
use alertdesk_core::{IncidentType, Level};
use regex::Regex;

const URGENCY_HIGH: &[&str] = &["緊急", "至急", "クリティカル", "停止", "即座", "障害"];
const URGENCY_MEDIUM: &[&str] = &["エラー", "不具合", "問題", "対応"];

const IMPACT_HIGH: &[&str] = &["全ユーザー", "すべて.*お客様", "全体", "サービス全体"];
const IMPACT_MEDIUM: &[&str] = &[
    "複数のお客様",
    "複数.*ユーザー",
    "一部.*お客様",
    "特定.*機能",
    "部分的",
];
const IMPACT_LOW: &[&str] = &["特定ユーザー.*のみ", "個別", "限定的", "一人.*お客様"];

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| compile_pattern(p).ok())
        .collect()
}

static URGENCY_PATTERNS: LazyLock<[(Level, Vec<Regex>); 2]> = LazyLock::new(|| {
    [
        (Level::High, compile_all(URGENCY_HIGH)),
        (Level::Medium, compile_all(URGENCY_MEDIUM)),
    ]
});

static IMPACT_PATTERNS: LazyLock<[(Level, Vec<Regex>); 3]> = LazyLock::new(|| {
    [
        (Level::High, compile_all(IMPACT_HIGH)),
        (Level::Medium, compile_all(IMPACT_MEDIUM)),
        (Level::Low, compile_all(IMPACT_LOW)),
    ]
});

/// First group (in severity order) with a matching pattern, else `Low`.
fn first_matching(text: &str, groups: &[(Level, Vec<Regex>)]) -> Level {
    groups
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(text)))
        .map(|(level, _)| *level)
        .unwrap_or(Level::Low)
}

pub fn classify_urgency(text: &str) -> Level {
    first_matching(text, URGENCY_PATTERNS.as_slice())
}

/// High groups are checked before medium, medium before low.
pub fn classify_impact(text: &str) -> Level {
    first_matching(text, IMPACT_PATTERNS.as_slice())
}

/// Incident type for a heuristic classification. Always defined.
pub fn determine_incident_level(urgency: Level, impact: Level) -> IncidentType {
    if matches!(urgency, Level::High | Level::Medium) || impact == Level::High {
        IncidentType::Outage
    } else {
        IncidentType::Bug
    }
}
