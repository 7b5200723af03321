use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::NotificationStore;
use crate::infrastructure::NotifyError;
use crate::models::{
    AppNotification, NotificationKind, NotificationPriority, NotificationStatus,
};

/// SQLite 通知存储
pub struct SqliteNotificationStore {
    pool: SqlitePool,
}

impl SqliteNotificationStore {
    /// 连接数据库并创建表结构
    pub async fn new(connection_string: &str) -> Result<Self, NotifyError> {
        let pool = SqlitePool::connect(connection_string).await?;

        let store = Self { pool };
        store.create_tables().await?;

        Ok(store)
    }

    /// 内存数据库存储，限制单连接，连接间不共享内存库
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Result<Self, NotifyError> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.create_tables().await?;

        Ok(store)
    }

    /// 创建数据库表
    async fn create_tables(&self) -> Result<(), NotifyError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                category TEXT,
                title TEXT NOT NULL,
                message TEXT,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                action_url TEXT,
                action_text TEXT,
                related_project_id TEXT,
                related_paper_id TEXT,
                related_task_id TEXT,
                metadata_json TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                read_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes separately
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_app_notifications_user_created \
             ON app_notifications (user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        info!("SQLite table 'app_notifications' created or verified");
        Ok(())
    }

    fn extract_notification(row: &sqlx::sqlite::SqliteRow) -> Result<AppNotification, NotifyError> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let kind: String = row.try_get("kind")?;
        let priority: String = row.try_get("priority")?;
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;
        let read_at: Option<String> = row.try_get("read_at")?;

        Ok(AppNotification {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            kind: NotificationKind::parse(&kind)
                .ok_or_else(|| storage_err(format!("unknown notification kind '{kind}'")))?,
            category: row.try_get("category")?,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            priority: NotificationPriority::parse(&priority)
                .ok_or_else(|| storage_err(format!("unknown priority '{priority}'")))?,
            status: NotificationStatus::parse(&status)
                .ok_or_else(|| storage_err(format!("unknown status '{status}'")))?,
            action_url: row.try_get("action_url")?,
            action_text: row.try_get("action_text")?,
            related_project_id: row.try_get("related_project_id")?,
            related_paper_id: row.try_get("related_paper_id")?,
            related_task_id: row.try_get("related_task_id")?,
            metadata_json: row.try_get("metadata_json")?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
            read_at: read_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    async fn insert(&self, record: &AppNotification) -> Result<(), NotifyError> {
        sqlx::query(
            r#"
            INSERT INTO app_notifications (
                id, user_id, kind, category, title, message, priority, status,
                action_url, action_text, related_project_id, related_paper_id,
                related_task_id, metadata_json, created_at, updated_at, read_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.kind.as_str())
        .bind(&record.category)
        .bind(&record.title)
        .bind(&record.message)
        .bind(record.priority.as_str())
        .bind(record.status.as_str())
        .bind(&record.action_url)
        .bind(&record.action_text)
        .bind(&record.related_project_id)
        .bind(&record.related_paper_id)
        .bind(&record.related_task_id)
        .bind(&record.metadata_json)
        .bind(format_timestamp(record.created_at))
        .bind(format_timestamp(record.updated_at))
        .bind(record.read_at.map(format_timestamp))
        .execute(&self.pool)
        .await?;

        debug!(id = %record.id, user_id = %record.user_id, "inserted notification");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AppNotification>, NotifyError> {
        let row = sqlx::query("SELECT * FROM app_notifications WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::extract_notification).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<AppNotification>, NotifyError> {
        let rows = sqlx::query(
            "SELECT * FROM app_notifications WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::extract_notification).collect()
    }

    async fn update(&self, record: &AppNotification) -> Result<(), NotifyError> {
        sqlx::query(
            r#"
            UPDATE app_notifications
            SET status = ?, updated_at = ?, read_at = ?
            WHERE id = ?
            "#,
        )
        .bind(record.status.as_str())
        .bind(format_timestamp(record.updated_at))
        .bind(record.read_at.map(format_timestamp))
        .bind(record.id.to_string())
        .execute(&self.pool)
        .await?;

        debug!(id = %record.id, status = record.status.as_str(), "updated notification");
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), NotifyError> {
        sqlx::query("DELETE FROM app_notifications WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        debug!(id = %id, "deleted notification");
        Ok(())
    }
}

// 固定宽度的 UTC 时间戳，保证字典序与时间序一致
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, NotifyError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| storage_err(format!("invalid timestamp '{s}': {e}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, NotifyError> {
    Uuid::parse_str(s).map_err(|e| storage_err(format!("invalid uuid '{s}': {e}")))
}

fn storage_err(message: String) -> NotifyError {
    NotifyError::Storage { message }
}
