use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 当前 UTC 时间，截断到微秒，与存储的时间戳精度一致
pub fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(now.nanosecond() / 1000 * 1000)
        .unwrap_or(now)
}

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    System,
    Project,
    Paper,
    Task,
    Alert,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::System => "SYSTEM",
            NotificationKind::Project => "PROJECT",
            NotificationKind::Paper => "PAPER",
            NotificationKind::Task => "TASK",
            NotificationKind::Alert => "ALERT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SYSTEM" => Some(NotificationKind::System),
            "PROJECT" => Some(NotificationKind::Project),
            "PAPER" => Some(NotificationKind::Paper),
            "TASK" => Some(NotificationKind::Task),
            "ALERT" => Some(NotificationKind::Alert),
            _ => None,
        }
    }
}

/// 通知优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for NotificationPriority {
    fn default() -> Self {
        NotificationPriority::Medium
    }
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "LOW",
            NotificationPriority::Medium => "MEDIUM",
            NotificationPriority::High => "HIGH",
            NotificationPriority::Urgent => "URGENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(NotificationPriority::Low),
            "MEDIUM" => Some(NotificationPriority::Medium),
            "HIGH" => Some(NotificationPriority::High),
            "URGENT" => Some(NotificationPriority::Urgent),
            _ => None,
        }
    }
}

/// 通知状态，只允许 UNREAD -> READ 的单向转换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Unread,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "UNREAD",
            NotificationStatus::Read => "READ",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNREAD" => Some(NotificationStatus::Unread),
            "READ" => Some(NotificationStatus::Read),
            _ => None,
        }
    }
}

/// 应用内通知记录
///
/// 不变量: `status == READ` 当且仅当 `read_at` 已设置，
/// 且 `created_at <= updated_at` 恒成立。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub category: Option<String>,
    pub title: String,
    pub message: Option<String>,
    pub priority: NotificationPriority,
    pub status: NotificationStatus,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
    pub related_project_id: Option<String>,
    pub related_paper_id: Option<String>,
    pub related_task_id: Option<String>,
    /// 元数据以序列化后的 JSON 文本存储，反序列化由读取方负责
    pub metadata_json: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// 创建通知的请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub category: Option<String>,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub priority: Option<NotificationPriority>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub action_text: Option<String>,
    #[serde(default)]
    pub related_project_id: Option<String>,
    #[serde(default)]
    pub related_paper_id: Option<String>,
    #[serde(default)]
    pub related_task_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip() {
        for kind in [
            NotificationKind::System,
            NotificationKind::Project,
            NotificationKind::Paper,
            NotificationKind::Task,
            NotificationKind::Alert,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("BOGUS"), None);
        assert_eq!(NotificationStatus::parse("UNREAD"), Some(NotificationStatus::Unread));
        assert_eq!(NotificationPriority::parse("URGENT"), Some(NotificationPriority::Urgent));
    }

    #[test]
    fn test_new_notification_wire_format() {
        let body = serde_json::json!({
            "userId": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            "type": "TASK",
            "title": "Summary ready",
            "relatedTaskId": "task-42"
        });

        let req: NewNotification = serde_json::from_value(body).unwrap();
        assert_eq!(req.kind, NotificationKind::Task);
        assert_eq!(req.title, "Summary ready");
        assert_eq!(req.related_task_id.as_deref(), Some("task-42"));
        assert!(req.priority.is_none());
        assert!(req.metadata.is_none());
    }

    #[test]
    fn test_notification_serializes_camel_case() {
        let now = Utc::now();
        let record = AppNotification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: NotificationKind::System,
            category: None,
            title: "Welcome".to_string(),
            message: None,
            priority: NotificationPriority::Medium,
            status: NotificationStatus::Unread,
            action_url: None,
            action_text: None,
            related_project_id: None,
            related_paper_id: None,
            related_task_id: None,
            metadata_json: None,
            created_at: now,
            updated_at: now,
            read_at: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "UNREAD");
        assert_eq!(json["type"], "SYSTEM");
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json["readAt"].is_null());
    }
}
