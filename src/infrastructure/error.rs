use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 通知服务错误类型
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum NotifyError {
    #[error("验证错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("通知 {id} 不存在")]
    NotFound { id: String },

    #[error("邮件配置错误: {message}")]
    Configuration { message: String },

    #[error("模板 '{template}' 渲染失败: {message}")]
    Render { template: String, message: String },

    #[error("发送邮件到 {recipient} 失败 (共 {attempts} 次尝试): {cause}")]
    DeliverySend {
        recipient: String,
        attempts: u32,
        cause: String,
    },

    #[error("发送邮件到 {recipient} 的重试等待被中断")]
    Interrupted { recipient: String },

    #[error("元数据序列化失败: {message}")]
    Serialization { message: String },

    #[error("存储错误: {message}")]
    Storage { message: String },
}

impl NotifyError {
    /// 检查错误是否源自瞬时故障
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NotifyError::DeliverySend { .. } | NotifyError::Storage { .. }
        )
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>, field: Option<String>) -> Self {
        NotifyError::Validation {
            message: message.into(),
            field,
        }
    }

    /// 创建未找到错误
    pub fn not_found(id: impl Into<String>) -> Self {
        NotifyError::NotFound { id: id.into() }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        NotifyError::Configuration {
            message: message.into(),
        }
    }

    /// 创建模板渲染错误
    pub fn render(template: impl Into<String>, message: impl Into<String>) -> Self {
        NotifyError::Render {
            template: template.into(),
            message: message.into(),
        }
    }

    /// 创建投递失败错误
    pub fn delivery(recipient: impl Into<String>, attempts: u32, cause: impl Into<String>) -> Self {
        NotifyError::DeliverySend {
            recipient: recipient.into(),
            attempts,
            cause: cause.into(),
        }
    }

    /// 创建中断错误
    pub fn interrupted(recipient: impl Into<String>) -> Self {
        NotifyError::Interrupted {
            recipient: recipient.into(),
        }
    }
}

impl From<sqlx::Error> for NotifyError {
    fn from(error: sqlx::Error) -> Self {
        NotifyError::Storage {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(error: serde_json::Error) -> Self {
        NotifyError::Serialization {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(NotifyError::delivery("a@b.com", 3, "connection refused").is_retryable());
        assert!(NotifyError::Storage {
            message: "locked".to_string()
        }
        .is_retryable());

        assert!(!NotifyError::validation("title is blank", Some("title".to_string())).is_retryable());
        assert!(!NotifyError::config("no sender").is_retryable());
        assert!(!NotifyError::render("welcome-email", "bad syntax").is_retryable());
        assert!(!NotifyError::interrupted("a@b.com").is_retryable());
    }

    #[test]
    fn test_delivery_error_carries_recipient_and_cause() {
        let err = NotifyError::delivery("user@example.com", 3, "timed out");
        let text = err.to_string();
        assert!(text.contains("user@example.com"));
        assert!(text.contains("timed out"));
        assert!(text.contains('3'));
    }

    #[test]
    fn test_serde_json_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json");
        let err: NotifyError = bad.unwrap_err().into();
        assert!(matches!(err, NotifyError::Serialization { .. }));
    }
}
