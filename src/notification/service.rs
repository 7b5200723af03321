use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::infrastructure::NotifyError;
use crate::models::{now_micros, AppNotification, NewNotification, NotificationStatus};
use crate::storage::NotificationStore;

/// 批量标记已读的结果
///
/// 每个 id 独立处理，单个失败不会中止剩余的处理。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReadReport {
    pub updated: Vec<Uuid>,
    pub failed: Vec<BatchReadFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReadFailure {
    pub id: Uuid,
    pub reason: String,
}

/// 应用内通知生命周期服务
///
/// 负责通知记录的状态机: 创建 -> 已读 -> 删除。
pub struct AppNotificationService {
    store: Arc<dyn NotificationStore>,
}

impl AppNotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// 列出用户的全部通知，按创建时间倒序
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<AppNotification>, NotifyError> {
        debug!(%user_id, "listing notifications");
        self.store.list_by_user(user_id).await
    }

    /// 创建通知，初始状态为 UNREAD
    pub async fn create(&self, req: NewNotification) -> Result<AppNotification, NotifyError> {
        if req.title.trim().is_empty() {
            return Err(NotifyError::validation(
                "title must not be blank",
                Some("title".to_string()),
            ));
        }

        let metadata_json = req
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let now = now_micros();
        let record = AppNotification {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            kind: req.kind,
            category: req.category,
            title: req.title,
            message: req.message,
            priority: req.priority.unwrap_or_default(),
            status: NotificationStatus::Unread,
            action_url: req.action_url,
            action_text: req.action_text,
            related_project_id: req.related_project_id,
            related_paper_id: req.related_paper_id,
            related_task_id: req.related_task_id,
            metadata_json,
            created_at: now,
            updated_at: now,
            read_at: None,
        };

        self.store.insert(&record).await?;
        info!(
            id = %record.id,
            user_id = %record.user_id,
            kind = record.kind.as_str(),
            "created app notification"
        );
        Ok(record)
    }

    /// 标记通知为已读
    ///
    /// 对已读记录重复调用不报错，但会重新盖 `read_at`/`updated_at` 时间戳。
    pub async fn mark_read(&self, id: Uuid) -> Result<AppNotification, NotifyError> {
        let mut record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| NotifyError::not_found(id.to_string()))?;

        let now = now_micros();
        record.status = NotificationStatus::Read;
        record.read_at = Some(now);
        record.updated_at = now;

        self.store.update(&record).await?;
        info!(%id, "marked notification as read");
        Ok(record)
    }

    /// 批量标记已读，收集每个 id 的失败而不中止整批
    pub async fn mark_multiple_read(&self, ids: &[Uuid]) -> Result<BatchReadReport, NotifyError> {
        let mut report = BatchReadReport::default();

        for &id in ids {
            match self.mark_read(id).await {
                Ok(_) => report.updated.push(id),
                Err(e) => {
                    warn!(%id, error = %e, "failed to mark notification as read");
                    report.failed.push(BatchReadFailure {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            "batch mark-read finished"
        );
        Ok(report)
    }

    /// 删除通知，id 不存在时为空操作
    pub async fn delete(&self, id: Uuid) -> Result<(), NotifyError> {
        self.store.delete(id).await?;
        info!(%id, "deleted notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationKind, NotificationPriority};
    use crate::storage::SqliteNotificationStore;
    use std::collections::HashMap;

    async fn service() -> AppNotificationService {
        let store = SqliteNotificationStore::in_memory().await.unwrap();
        AppNotificationService::new(Arc::new(store))
    }

    fn new_request(user_id: Uuid, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            kind: NotificationKind::Task,
            category: None,
            title: title.to_string(),
            message: Some("your task finished".to_string()),
            priority: None,
            action_url: None,
            action_text: None,
            related_project_id: None,
            related_paper_id: None,
            related_task_id: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_create_starts_unread_with_equal_timestamps() {
        let service = service().await;
        let created = service
            .create(new_request(Uuid::new_v4(), "Summary ready"))
            .await
            .unwrap();

        assert_eq!(created.status, NotificationStatus::Unread);
        assert!(created.read_at.is_none());
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.priority, NotificationPriority::Medium);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let service = service().await;
        let err = service
            .create(new_request(Uuid::new_v4(), "   "))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NotifyError::Validation { ref field, .. } if field.as_deref() == Some("title")
        ));
    }

    #[tokio::test]
    async fn test_create_serializes_metadata() {
        let service = service().await;
        let mut req = new_request(Uuid::new_v4(), "With metadata");
        let mut metadata = HashMap::new();
        metadata.insert("taskId".to_string(), serde_json::json!("task-7"));
        metadata.insert("durationMs".to_string(), serde_json::json!(1500));
        req.metadata = Some(metadata);

        let created = service.create(req).await.unwrap();
        let stored: serde_json::Value =
            serde_json::from_str(created.metadata_json.as_deref().unwrap()).unwrap();
        assert_eq!(stored["taskId"], "task-7");
        assert_eq!(stored["durationMs"], 1500);
    }

    #[tokio::test]
    async fn test_mark_read_sets_status_and_read_at() {
        let service = service().await;
        let created = service
            .create(new_request(Uuid::new_v4(), "Unread"))
            .await
            .unwrap();

        let updated = service.mark_read(created.id).await.unwrap();
        assert_eq!(updated.status, NotificationStatus::Read);
        assert!(updated.read_at.is_some());
        assert!(updated.updated_at >= updated.created_at);

        let fetched = service
            .list_by_user(created.user_id)
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(fetched.status, NotificationStatus::Read);
    }

    #[tokio::test]
    async fn test_mark_read_restamps_already_read_record() {
        let service = service().await;
        let created = service
            .create(new_request(Uuid::new_v4(), "Read twice"))
            .await
            .unwrap();

        let first = service.mark_read(created.id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = service.mark_read(created.id).await.unwrap();

        assert_eq!(second.status, NotificationStatus::Read);
        assert!(second.read_at.unwrap() > first.read_at.unwrap());
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id_is_not_found() {
        let service = service().await;
        let user_id = Uuid::new_v4();
        service.create(new_request(user_id, "Existing")).await.unwrap();

        let err = service.mark_read(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotFound { .. }));

        // The failed call must not mutate the store
        let records = service.list_by_user(user_id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, NotificationStatus::Unread);
    }

    #[tokio::test]
    async fn test_mark_multiple_read_collects_failures() {
        let service = service().await;
        let user_id = Uuid::new_v4();
        let a = service.create(new_request(user_id, "a")).await.unwrap();
        let b = service.create(new_request(user_id, "b")).await.unwrap();
        let missing = Uuid::new_v4();

        let report = service
            .mark_multiple_read(&[a.id, missing, b.id])
            .await
            .unwrap();

        assert_eq!(report.updated, vec![a.id, b.id]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, missing);

        // The failure in the middle must not stop later ids from updating
        for record in service.list_by_user(user_id).await.unwrap() {
            assert_eq!(record.status, NotificationStatus::Read);
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let service = service().await;
        service.delete(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let service = service().await;
        let owner = Uuid::new_v4();
        service.create(new_request(owner, "mine")).await.unwrap();
        service
            .create(new_request(Uuid::new_v4(), "someone else's"))
            .await
            .unwrap();

        let records = service.list_by_user(owner).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "mine");

        // Unknown owner yields an empty list, not an error
        assert!(service.list_by_user(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
