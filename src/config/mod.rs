use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::email::RetryPolicy;

/// 全局应用配置，从环境变量加载
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务监听地址
    pub bind_addr: String,
    /// SQLite 连接字符串
    pub database_url: String,
    /// 邮件发送配置
    pub email: EmailConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            database_url: env_or("DATABASE_URL", "sqlite://notifications.db?mode=rwc"),
            email: EmailConfig::from_env()?,
        })
    }
}

/// 邮件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP 服务器地址
    pub smtp_server: String,
    /// SMTP 端口
    pub smtp_port: u16,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 发件人地址，为空时拒绝发送
    pub from_address: String,
    /// 发件人名称
    pub from_name: Option<String>,
    /// 应用显示名称，用于邮件主题
    pub app_name: String,
    /// 投递重试策略
    pub retry: RetryPolicy,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "localhost".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_address: String::new(),
            from_name: None,
            app_name: "ScholarAI".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EmailConfig {
    /// 从环境变量加载邮件配置
    pub fn from_env() -> anyhow::Result<Self> {
        let max_attempts: u32 = env_or("EMAIL_RETRY_MAX_ATTEMPTS", "3")
            .parse()
            .map_err(|_| anyhow::anyhow!("EMAIL_RETRY_MAX_ATTEMPTS must be a positive integer"))?;
        let base_delay_ms: u64 = env_or("EMAIL_RETRY_BASE_DELAY_MS", "1000")
            .parse()
            .map_err(|_| anyhow::anyhow!("EMAIL_RETRY_BASE_DELAY_MS must be milliseconds"))?;
        let smtp_port: u16 = env_or("SMTP_PORT", "587")
            .parse()
            .map_err(|_| anyhow::anyhow!("SMTP_PORT must be a valid port number"))?;

        Ok(Self {
            smtp_server: env_or("SMTP_SERVER", "localhost"),
            smtp_port,
            username: env_or("SMTP_USERNAME", ""),
            password: env_or("SMTP_PASSWORD", ""),
            from_address: env_or("MAIL_FROM", ""),
            from_name: std::env::var("MAIL_FROM_NAME").ok(),
            app_name: env_or("APP_NAME", "ScholarAI"),
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(base_delay_ms),
            },
        })
    }

    /// 发件人是否已配置
    pub fn is_sender_configured(&self) -> bool {
        !self.from_address.trim().is_empty()
    }

    /// 格式化发件人地址，带可选显示名称
    pub fn sender_mailbox(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_address),
            None => self.from_address.clone(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
