use async_trait::async_trait;
use uuid::Uuid;

use crate::infrastructure::NotifyError;
use crate::models::AppNotification;

pub mod sqlite;

pub use sqlite::SqliteNotificationStore;

/// 通知记录存储 trait
///
/// 每个操作都是独立的单记录事务，必须支持并发调用。
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// 插入新记录
    async fn insert(&self, record: &AppNotification) -> Result<(), NotifyError>;

    /// 按 id 查找记录
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AppNotification>, NotifyError>;

    /// 列出用户的全部记录，按创建时间倒序
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<AppNotification>, NotifyError>;

    /// 更新已有记录
    async fn update(&self, record: &AppNotification) -> Result<(), NotifyError>;

    /// 删除记录，id 不存在时为空操作
    async fn delete(&self, id: Uuid) -> Result<(), NotifyError>;
}
