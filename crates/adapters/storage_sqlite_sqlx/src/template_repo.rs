//! `SQLite` implementation of [`TemplateRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use herald_app::ports::TemplateRepository;
use herald_domain::error::HeraldError;
use herald_domain::rule::ActionKind;
use herald_domain::template::Template;

use crate::codec::{decode_error, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(Template);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Template> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let channel: String = row.try_get("channel")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Self(Template {
            slug: row.try_get("slug")?,
            channel: ActionKind::from_str(&channel).map_err(decode_error)?,
            event_type: row.try_get("event_type")?,
            subject: row.try_get("subject")?,
            body: row.try_get("body")?,
            icon: row.try_get("icon")?,
            url: row.try_get("url")?,
            is_active: row.try_get("is_active")?,
            updated_at: decode_timestamp(&updated_at)?,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO templates (channel, slug, event_type, subject, body, icon, url, is_active, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (channel, slug, event_type) DO UPDATE SET
        subject = excluded.subject,
        body = excluded.body,
        icon = excluded.icon,
        url = excluded.url,
        is_active = excluded.is_active,
        updated_at = excluded.updated_at
";

const SELECT_ONE: &str =
    "SELECT * FROM templates WHERE channel = ? AND slug = ? AND event_type = ?";
const SELECT_ALL: &str = "SELECT * FROM templates ORDER BY event_type, channel, slug";

/// `SQLite`-backed template repository.
#[derive(Debug, Clone)]
pub struct SqliteTemplateRepository {
    pool: SqlitePool,
}

impl SqliteTemplateRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TemplateRepository for SqliteTemplateRepository {
    async fn find(
        &self,
        channel: ActionKind,
        slug: &str,
        event_type: &str,
    ) -> Result<Option<Template>, HeraldError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_ONE)
            .bind(channel.as_str())
            .bind(slug)
            .bind(event_type)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn upsert(&self, template: Template) -> Result<Template, HeraldError> {
        sqlx::query(UPSERT)
            .bind(template.channel.as_str())
            .bind(&template.slug)
            .bind(&template.event_type)
            .bind(&template.subject)
            .bind(&template.body)
            .bind(&template.icon)
            .bind(&template.url)
            .bind(template.is_active)
            .bind(encode_timestamp(template.updated_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(template)
    }

    async fn get_all(&self) -> Result<Vec<Template>, HeraldError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
