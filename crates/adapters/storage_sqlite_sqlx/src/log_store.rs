//! `SQLite` implementation of [`LogStore`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use herald_app::ports::LogStore;
use herald_domain::error::HeraldError;
use herald_domain::id::{EventId, LogId, RuleId};
use herald_domain::log::{ActionResult, AutomationLog, Page, PageRequest, RuleStatus};

use crate::codec::{decode_error, decode_json, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(AutomationLog);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let rule_id: uuid::Uuid = row.try_get("rule_id")?;
        let event_id: uuid::Uuid = row.try_get("event_id")?;
        let executed_at: String = row.try_get("executed_at")?;
        let status: String = row.try_get("status")?;
        let action_results: String = row.try_get("action_results")?;

        Ok(Self(AutomationLog {
            id: LogId::from_uuid(id),
            rule_id: RuleId::from_uuid(rule_id),
            rule_name: row.try_get("rule_name")?,
            event_id: EventId::from_uuid(event_id),
            event_type: row.try_get("event_type")?,
            executed_at: decode_timestamp(&executed_at)?,
            status: RuleStatus::from_str(&status).map_err(decode_error)?,
            action_results: decode_json::<Vec<ActionResult>>(&action_results)?,
            error: row.try_get("error")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO automation_logs
        (id, rule_id, rule_name, event_id, event_type, executed_at, status, action_results, error)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const COUNT: &str = "SELECT COUNT(*) FROM automation_logs WHERE (? IS NULL OR rule_id = ?)";

const SELECT_PAGE: &str = r"
    SELECT * FROM automation_logs
    WHERE (? IS NULL OR rule_id = ?)
    ORDER BY executed_at DESC, rowid DESC
    LIMIT ? OFFSET ?
";

/// `SQLite`-backed append-only automation log.
#[derive(Debug, Clone)]
pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    /// Create a new log store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl LogStore for SqliteLogStore {
    async fn append(&self, log: AutomationLog) -> Result<AutomationLog, HeraldError> {
        let action_results =
            serde_json::to_string(&log.action_results).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(log.id.as_uuid())
            .bind(log.rule_id.as_uuid())
            .bind(&log.rule_name)
            .bind(log.event_id.as_uuid())
            .bind(&log.event_type)
            .bind(encode_timestamp(log.executed_at))
            .bind(log.status.as_str())
            .bind(&action_results)
            .bind(&log.error)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(log)
    }

    async fn list(
        &self,
        page: PageRequest,
        rule_id: Option<RuleId>,
    ) -> Result<Page<AutomationLog>, HeraldError> {
        let rule_id = rule_id.map(RuleId::as_uuid);

        let (total,): (i64,) = sqlx::query_as(COUNT)
            .bind(rule_id)
            .bind(rule_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_PAGE)
            .bind(rule_id)
            .bind(rule_id)
            .bind(i64::from(page.per_page))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Page::new(
            rows.into_iter().map(|w| w.0).collect(),
            page,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}
