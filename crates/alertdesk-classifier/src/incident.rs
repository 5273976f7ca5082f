// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store-backed incident classification and manual overrides.

use std::sync::Arc;

use alertdesk_core::{AlertdeskError, Classification, Level, RuleKind, StorageAdapter};
use tracing::debug;

use crate::rules::{classify_level, determine_incident_type};

/// Classifies message text using the enabled rules in storage.
pub struct IncidentClassifier {
    storage: Arc<dyn StorageAdapter>,
}

impl IncidentClassifier {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Classify a message together with its thread replies.
    ///
    /// Texts are joined with single spaces, so a pattern can match across the
    /// parent message and a reply.
    pub async fn classify(
        &self,
        message_text: &str,
        thread_texts: &[String],
    ) -> Result<Classification, AlertdeskError> {
        let combined = std::iter::once(message_text)
            .chain(thread_texts.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        let urgency_rules = self.storage.list_rules(RuleKind::Urgency, true).await?;
        let impact_rules = self.storage.list_rules(RuleKind::Impact, true).await?;

        let urgency = classify_level(&combined, &urgency_rules);
        let impact = classify_level(&combined, &impact_rules);
        let incident_type = determine_incident_type(urgency, impact);
        debug!(?urgency, ?impact, ?incident_type, "classified incident text");

        Ok(Classification {
            urgency,
            impact,
            incident_type,
            auto_classified: true,
            urgency_manual: false,
            impact_manual: false,
        })
    }
}

/// An operator's choice for one classification dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override<T> {
    /// Keep the current value.
    Keep,
    /// Replace the value. `Set(None)` clears it.
    Set(Option<T>),
}

/// Apply operator overrides and re-derive the incident type.
///
/// The manual flag of a dimension is set exactly when that dimension was
/// overridden, including an explicit clear.
pub fn apply_manual_override(
    current: &Classification,
    urgency: Override<Level>,
    impact: Override<Level>,
) -> Classification {
    let (urgency, urgency_manual) = match urgency {
        Override::Keep => (current.urgency, false),
        Override::Set(value) => (value, true),
    };
    let (impact, impact_manual) = match impact {
        Override::Keep => (current.impact, false),
        Override::Set(value) => (value, true),
    };

    Classification {
        urgency,
        impact,
        incident_type: determine_incident_type(urgency, impact),
        auto_classified: current.auto_classified,
        urgency_manual,
        impact_manual,
    }
}

#[cfg(test)]
mod tests {
    use alertdesk_core::{IncidentType, NewRule};
    use alertdesk_test_utils::MemoryStorage;

    use super::*;

    async fn storage_with_rules() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        for (kind, name, pattern, value, enabled) in [
            (RuleKind::Urgency, "stop", "停止|ダウン", Level::High, true),
            (RuleKind::Urgency, "error", "エラー", Level::Medium, true),
            (RuleKind::Urgency, "disabled", "遅い", Level::High, false),
            (RuleKind::Impact, "all", "全ユーザー", Level::High, true),
            (RuleKind::Impact, "some", "一部", Level::Low, true),
        ] {
            storage
                .create_rule(
                    kind,
                    &NewRule {
                        name: name.into(),
                        pattern: pattern.into(),
                        value,
                        enabled,
                    },
                )
                .await
                .unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn classifies_with_enabled_rules_only() {
        let classifier = IncidentClassifier::new(storage_with_rules().await);
        let result = classifier.classify("画面が遅い", &[]).await.unwrap();
        assert_eq!(result.urgency, None);
        assert_eq!(result.impact, None);
        assert_eq!(result.incident_type, None);
        assert!(result.auto_classified);
    }

    #[tokio::test]
    async fn thread_text_contributes_to_classification() {
        let classifier = IncidentClassifier::new(storage_with_rules().await);
        let result = classifier
            .classify(
                "決済でエラー",
                &["全ユーザーに影響しています".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(result.urgency, Some(Level::Medium));
        assert_eq!(result.impact, Some(Level::High));
        assert_eq!(result.incident_type, Some(IncidentType::Outage));
    }

    #[tokio::test]
    async fn low_impact_alone_is_a_bug() {
        let classifier = IncidentClassifier::new(storage_with_rules().await);
        let result = classifier.classify("一部の画面表示崩れ", &[]).await.unwrap();
        assert_eq!(result.urgency, None);
        assert_eq!(result.impact, Some(Level::Low));
        assert_eq!(result.incident_type, Some(IncidentType::Bug));
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let storage = storage_with_rules().await;
        storage.fail_rule_reads(true);
        let classifier = IncidentClassifier::new(storage);
        assert!(classifier.classify("停止", &[]).await.is_err());
    }

    fn auto(urgency: Option<Level>, impact: Option<Level>) -> Classification {
        Classification {
            urgency,
            impact,
            incident_type: determine_incident_type(urgency, impact),
            auto_classified: true,
            urgency_manual: false,
            impact_manual: false,
        }
    }

    #[test]
    fn override_replaces_and_rederives_type() {
        let current = auto(Some(Level::Low), Some(Level::Low));
        let updated = apply_manual_override(&current, Override::Set(Some(Level::High)), Override::Keep);
        assert_eq!(updated.urgency, Some(Level::High));
        assert_eq!(updated.impact, Some(Level::Low));
        assert_eq!(updated.incident_type, Some(IncidentType::Outage));
        assert!(updated.urgency_manual);
        assert!(!updated.impact_manual);
    }

    #[test]
    fn explicit_clear_counts_as_manual() {
        let current = auto(Some(Level::High), None);
        let updated = apply_manual_override(&current, Override::Set(None), Override::Keep);
        assert_eq!(updated.urgency, None);
        assert_eq!(updated.incident_type, None);
        assert!(updated.urgency_manual);
    }

    #[test]
    fn keep_keeps_everything() {
        let current = auto(Some(Level::Medium), Some(Level::High));
        let updated = apply_manual_override(&current, Override::Keep, Override::Keep);
        assert_eq!(updated, current);
    }
}
