//! `SQLite` implementation of [`RuleRepository`].
//!
//! A rule is one row in `rules` plus one row per action in `rule_actions`.
//! Every write touching actions runs in a single transaction.

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use herald_app::ports::RuleRepository;
use herald_domain::error::{HeraldError, NotFoundError};
use herald_domain::id::RuleId;
use herald_domain::rule::{ActionConfig, ActionKind, AutomationRule, ConditionExpr};
use herald_domain::time::Timestamp;

use crate::codec::{decode_error, decode_json, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(AutomationRule);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let conditions: Option<String> = row.try_get("conditions")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        let conditions = conditions
            .as_deref()
            .map(decode_json::<ConditionExpr>)
            .transpose()?;

        Ok(Self(AutomationRule {
            id: RuleId::from_uuid(id),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            event_type: row.try_get("event_type")?,
            is_active: row.try_get("is_active")?,
            conditions,
            actions: Vec::new(),
            created_at: decode_timestamp(&created_at)?,
            updated_at: decode_timestamp(&updated_at)?,
        }))
    }
}

struct ActionRow {
    rule_id: RuleId,
    action: ActionConfig,
}

impl<'r> FromRow<'r, SqliteRow> for ActionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let rule_id: uuid::Uuid = row.try_get("rule_id")?;
        let kind: String = row.try_get("kind")?;
        let order: i64 = row.try_get("sort_order")?;

        Ok(Self {
            rule_id: RuleId::from_uuid(rule_id),
            action: ActionConfig {
                kind: ActionKind::from_str(&kind).map_err(decode_error)?,
                template_ref: row.try_get("template_ref")?,
                order: u32::try_from(order).map_err(decode_error)?,
                recipient: row.try_get("recipient")?,
            },
        })
    }
}

const INSERT_RULE: &str = r"
    INSERT INTO rules (id, name, description, event_type, is_active, conditions, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE_RULE: &str = r"
    UPDATE rules
    SET name = ?, description = ?, event_type = ?, is_active = ?, conditions = ?, updated_at = ?
    WHERE id = ?
";

const INSERT_ACTION: &str = r"
    INSERT INTO rule_actions (rule_id, position, kind, template_ref, sort_order, recipient)
    VALUES (?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM rules WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM rules ORDER BY created_at, id";
const SELECT_ACTIVE: &str = "SELECT * FROM rules WHERE is_active = 1 ORDER BY created_at, id";
const SELECT_ACTIONS_BY_RULE: &str =
    "SELECT * FROM rule_actions WHERE rule_id = ? ORDER BY position";
const SELECT_ALL_ACTIONS: &str = "SELECT * FROM rule_actions ORDER BY rule_id, position";
const SELECT_ACTIVE_ACTIONS: &str = r"
    SELECT a.* FROM rule_actions a
    JOIN rules r ON r.id = a.rule_id
    WHERE r.is_active = 1
    ORDER BY a.rule_id, a.position
";

/// `SQLite`-backed rule repository.
#[derive(Debug, Clone)]
pub struct SqliteRuleRepository {
    pool: SqlitePool,
}

impl SqliteRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load(
        &self,
        rules_query: &str,
        actions_query: &str,
    ) -> Result<Vec<AutomationRule>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let rules: Vec<Wrapper> = sqlx::query_as(rules_query).fetch_all(&mut *tx).await?;
        let actions: Vec<ActionRow> = sqlx::query_as(actions_query).fetch_all(&mut *tx).await?;
        tx.commit().await?;

        let mut by_rule: HashMap<RuleId, Vec<ActionConfig>> = HashMap::new();
        for row in actions {
            by_rule.entry(row.rule_id).or_default().push(row.action);
        }
        Ok(rules
            .into_iter()
            .map(|Wrapper(mut rule)| {
                rule.actions = by_rule.remove(&rule.id).unwrap_or_default();
                rule
            })
            .collect())
    }
}

fn not_found(id: RuleId) -> HeraldError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}

fn encode_conditions(rule: &AutomationRule) -> Result<Option<String>, StorageError> {
    Ok(rule
        .conditions
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?)
}

async fn insert_actions(
    conn: &mut SqliteConnection,
    rule_id: RuleId,
    actions: &[ActionConfig],
) -> Result<(), StorageError> {
    for (position, action) in (0_i64..).zip(actions) {
        sqlx::query(INSERT_ACTION)
            .bind(rule_id.as_uuid())
            .bind(position)
            .bind(action.kind.as_str())
            .bind(&action.template_ref)
            .bind(i64::from(action.order))
            .bind(&action.recipient)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl RuleRepository for SqliteRuleRepository {
    async fn create(&self, rule: AutomationRule) -> Result<AutomationRule, HeraldError> {
        let conditions = encode_conditions(&rule)?;

        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        sqlx::query(INSERT_RULE)
            .bind(rule.id.as_uuid())
            .bind(&rule.name)
            .bind(&rule.description)
            .bind(&rule.event_type)
            .bind(rule.is_active)
            .bind(&conditions)
            .bind(encode_timestamp(rule.created_at))
            .bind(encode_timestamp(rule.updated_at))
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        insert_actions(&mut tx, rule.id, &rule.actions).await?;
        tx.commit().await.map_err(StorageError::from)?;

        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<AutomationRule>, HeraldError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        let Some(Wrapper(mut rule)) = row else {
            return Ok(None);
        };
        let actions: Vec<ActionRow> = sqlx::query_as(SELECT_ACTIONS_BY_RULE)
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;
        rule.actions = actions.into_iter().map(|row| row.action).collect();
        Ok(Some(rule))
    }

    async fn get_all(&self) -> Result<Vec<AutomationRule>, HeraldError> {
        Ok(self.load(SELECT_ALL, SELECT_ALL_ACTIONS).await?)
    }

    async fn get_active(&self) -> Result<Vec<AutomationRule>, HeraldError> {
        Ok(self.load(SELECT_ACTIVE, SELECT_ACTIVE_ACTIONS).await?)
    }

    async fn update(&self, rule: AutomationRule) -> Result<AutomationRule, HeraldError> {
        let conditions = encode_conditions(&rule)?;

        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let updated = sqlx::query(UPDATE_RULE)
            .bind(&rule.name)
            .bind(&rule.description)
            .bind(&rule.event_type)
            .bind(rule.is_active)
            .bind(&conditions)
            .bind(encode_timestamp(rule.updated_at))
            .bind(rule.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        if updated.rows_affected() == 0 {
            return Err(not_found(rule.id));
        }
        sqlx::query("DELETE FROM rule_actions WHERE rule_id = ?")
            .bind(rule.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        insert_actions(&mut tx, rule.id, &rule.actions).await?;
        tx.commit().await.map_err(StorageError::from)?;

        Ok(rule)
    }

    async fn replace_actions(
        &self,
        id: RuleId,
        actions: Vec<ActionConfig>,
        updated_at: Timestamp,
    ) -> Result<(), HeraldError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let touched = sqlx::query("UPDATE rules SET updated_at = ? WHERE id = ?")
            .bind(encode_timestamp(updated_at))
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        if touched.rows_affected() == 0 {
            return Err(not_found(id));
        }
        sqlx::query("DELETE FROM rule_actions WHERE rule_id = ?")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        insert_actions(&mut tx, id, &actions).await?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }

    async fn set_active(
        &self,
        id: RuleId,
        is_active: bool,
        updated_at: Timestamp,
    ) -> Result<(), HeraldError> {
        let result = sqlx::query("UPDATE rules SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(encode_timestamp(updated_at))
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: RuleId) -> Result<(), HeraldError> {
        sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
