// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification rule CRUD.
//!
//! Patterns are validated before they are written, so a stored rule always
//! compiled at the time it was saved.

use alertdesk_core::rules::{validate_new_rule, validate_rule_update};
use alertdesk_core::{AlertdeskError, ClassificationRule, NewRule, RuleKind, RuleUpdate};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

const RULE_COLUMNS: &str = "id, kind, name, pattern, value, enabled, created_at, updated_at";

fn row_to_rule(row: &rusqlite::Row<'_>) -> Result<ClassificationRule, rusqlite::Error> {
    Ok(ClassificationRule {
        id: row.get(0)?,
        kind: super::parse_column(1, row.get(1)?)?,
        name: row.get(2)?,
        pattern: row.get(3)?,
        value: super::parse_column(4, row.get(4)?)?,
        enabled: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn not_found(kind: RuleKind, id: &str) -> AlertdeskError {
    AlertdeskError::NotFound {
        entity: match kind {
            RuleKind::Urgency => "urgency rule",
            RuleKind::Impact => "impact rule",
        },
        id: id.to_string(),
    }
}

/// Rules of one kind in creation order, optionally only the enabled ones.
pub async fn list_rules(
    db: &Database,
    kind: RuleKind,
    enabled_only: bool,
) -> Result<Vec<ClassificationRule>, AlertdeskError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RULE_COLUMNS} FROM classification_rules
                 WHERE kind = ?1 AND (?2 = 0 OR enabled = 1)
                 ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map(params![kind.to_string(), enabled_only], row_to_rule)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn create_rule(
    db: &Database,
    kind: RuleKind,
    rule: &NewRule,
) -> Result<ClassificationRule, AlertdeskError> {
    validate_new_rule(rule)?;

    let now = super::now();
    let created = ClassificationRule {
        id: uuid::Uuid::new_v4().to_string(),
        kind,
        name: rule.name.clone(),
        pattern: rule.pattern.clone(),
        value: rule.value,
        enabled: rule.enabled,
        created_at: now.clone(),
        updated_at: now,
    };
    let row = created.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO classification_rules ({RULE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    row.id,
                    row.kind.to_string(),
                    row.name,
                    row.pattern,
                    row.value.to_string(),
                    row.enabled,
                    row.created_at,
                    row.updated_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(created)
}

/// Apply the fields set in `update`. Unknown ids are [`AlertdeskError::NotFound`].
pub async fn update_rule(
    db: &Database,
    kind: RuleKind,
    id: &str,
    update: &RuleUpdate,
) -> Result<ClassificationRule, AlertdeskError> {
    validate_rule_update(update)?;

    let key = id.to_string();
    let update = update.clone();
    let updated = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE classification_rules
                 SET name = COALESCE(?1, name),
                     pattern = COALESCE(?2, pattern),
                     value = COALESCE(?3, value),
                     enabled = COALESCE(?4, enabled),
                     updated_at = ?5
                 WHERE id = ?6 AND kind = ?7",
                params![
                    update.name,
                    update.pattern,
                    update.value.map(|v| v.to_string()),
                    update.enabled,
                    super::now(),
                    key,
                    kind.to_string()
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("SELECT {RULE_COLUMNS} FROM classification_rules WHERE id = ?1"),
                params![key],
                row_to_rule,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    updated.ok_or_else(|| not_found(kind, id))
}

pub async fn delete_rule(db: &Database, kind: RuleKind, id: &str) -> Result<(), AlertdeskError> {
    let key = id.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM classification_rules WHERE id = ?1 AND kind = ?2",
                params![key, kind.to_string()],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(not_found(kind, id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alertdesk_core::Level;

    use super::*;
    use crate::queries::test_support::open_temp;

    fn rule(name: &str, pattern: &str, value: Level, enabled: bool) -> NewRule {
        NewRule {
            name: name.into(),
            pattern: pattern.into(),
            value,
            enabled,
        }
    }

    #[tokio::test]
    async fn kinds_are_independent_collections() {
        let (db, _dir) = open_temp().await;
        create_rule(&db, RuleKind::Urgency, &rule("緊急", "緊急|至急", Level::High, true))
            .await
            .unwrap();
        create_rule(&db, RuleKind::Impact, &rule("全体", "全ユーザー", Level::High, true))
            .await
            .unwrap();

        assert_eq!(list_rules(&db, RuleKind::Urgency, false).await.unwrap().len(), 1);
        assert_eq!(list_rules(&db, RuleKind::Impact, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn enabled_only_filters_disabled_rules() {
        let (db, _dir) = open_temp().await;
        create_rule(&db, RuleKind::Urgency, &rule("on", "a", Level::Low, true)).await.unwrap();
        create_rule(&db, RuleKind::Urgency, &rule("off", "b", Level::High, false)).await.unwrap();

        let enabled = list_rules(&db, RuleKind::Urgency, true).await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "on");
        assert_eq!(list_rules(&db, RuleKind::Urgency, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_pattern_is_rejected_before_insert() {
        let (db, _dir) = open_temp().await;
        let err = create_rule(&db, RuleKind::Impact, &rule("bad", "([", Level::Low, true))
            .await
            .unwrap_err();
        assert!(matches!(err, AlertdeskError::Validation(_)));
        assert!(list_rules(&db, RuleKind::Impact, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let (db, _dir) = open_temp().await;
        let created = create_rule(&db, RuleKind::Urgency, &rule("r", "停止", Level::High, true))
            .await
            .unwrap();

        let update = RuleUpdate {
            value: Some(Level::Medium),
            enabled: Some(false),
            ..Default::default()
        };
        let updated = update_rule(&db, RuleKind::Urgency, &created.id, &update).await.unwrap();
        assert_eq!(updated.name, "r");
        assert_eq!(updated.pattern, "停止");
        assert_eq!(updated.value, Level::Medium);
        assert!(!updated.enabled);
    }

    #[tokio::test]
    async fn update_and_delete_of_unknown_id_are_not_found() {
        let (db, _dir) = open_temp().await;
        let err = update_rule(&db, RuleKind::Impact, "nope", &RuleUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AlertdeskError::NotFound { .. }));

        let err = delete_rule(&db, RuleKind::Impact, "nope").await.unwrap_err();
        assert!(matches!(err, AlertdeskError::NotFound { .. }));
    }

    #[tokio::test]
    async fn rule_of_other_kind_is_not_visible_to_delete() {
        let (db, _dir) = open_temp().await;
        let created = create_rule(&db, RuleKind::Urgency, &rule("r", "x", Level::Low, true))
            .await
            .unwrap();
        assert!(delete_rule(&db, RuleKind::Impact, &created.id).await.is_err());
        delete_rule(&db, RuleKind::Urgency, &created.id).await.unwrap();
        assert!(list_rules(&db, RuleKind::Urgency, false).await.unwrap().is_empty());
    }
}
