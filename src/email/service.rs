use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::EmailConfig;
use crate::email::templates::TemplateEngine;
use crate::email::transport::{ComposedEmail, MailTransport};
use crate::infrastructure::NotifyError;

/// 一次邮件投递请求，仅在投递期间存在，不持久化
#[derive(Debug, Clone)]
pub struct EmailRequest {
    pub to_address: String,
    /// 收件人显示名称，仅用于日志
    pub to_name: Option<String>,
    pub data: HashMap<String, serde_json::Value>,
}

impl EmailRequest {
    pub fn new(to_address: impl Into<String>) -> Self {
        Self {
            to_address: to_address.into(),
            to_name: None,
            data: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.to_name = Some(name.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// 邮件发送服务
///
/// 渲染模板并通过传输投递，传输失败时按 `RetryPolicy` 线性退避重试。
/// 每次调用状态机: 组装 -> 发送 -> (成功 | 重试 -> 发送)* -> (成功 | 失败)。
pub struct EmailService {
    config: EmailConfig,
    transport: Arc<dyn MailTransport>,
    templates: TemplateEngine,
    shutdown: Option<watch::Receiver<bool>>,
}

impl EmailService {
    pub fn new(config: EmailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            config,
            transport,
            templates: TemplateEngine::new(),
            shutdown: None,
        }
    }

    /// 关联关闭信号；信号变更或发送端关闭都视为取消
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub async fn send_welcome_email(&self, request: &EmailRequest) -> Result<(), NotifyError> {
        let subject = format!("Welcome to {}!", self.config.app_name);
        self.send_templated(request, &subject, "welcome-email").await
    }

    pub async fn send_password_reset_email(&self, request: &EmailRequest) -> Result<(), NotifyError> {
        let subject = format!("Password Reset - {}", self.config.app_name);
        self.send_templated(request, &subject, "password-reset-email")
            .await
    }

    pub async fn send_email_verification_email(
        &self,
        request: &EmailRequest,
    ) -> Result<(), NotifyError> {
        let subject = format!("Verify Your Email - {}", self.config.app_name);
        self.send_templated(request, &subject, "email-verification")
            .await
    }

    pub async fn send_web_search_completed_email(
        &self,
        request: &EmailRequest,
    ) -> Result<(), NotifyError> {
        self.send_templated(
            request,
            "Your Search Results Are Ready",
            "web-search-completed-email",
        )
        .await
    }

    pub async fn send_summarization_completed_email(
        &self,
        request: &EmailRequest,
    ) -> Result<(), NotifyError> {
        self.send_templated(
            request,
            "Your Summary Is Ready",
            "summarization-completed-email",
        )
        .await
    }

    pub async fn send_gap_analysis_completed_email(
        &self,
        request: &EmailRequest,
    ) -> Result<(), NotifyError> {
        self.send_templated(request, "Gap Analysis Complete", "gap-analysis-completed-email")
            .await
    }

    pub async fn send_project_deleted_email(&self, request: &EmailRequest) -> Result<(), NotifyError> {
        let subject = format!("Project Deleted - {}", self.config.app_name);
        self.send_templated(request, &subject, "project-deleted-email")
            .await
    }

    /// 共享投递路径: 校验配置、渲染一次、带重试投递
    pub async fn send_templated(
        &self,
        request: &EmailRequest,
        subject: &str,
        template_id: &str,
    ) -> Result<(), NotifyError> {
        if !self.config.is_sender_configured() {
            return Err(NotifyError::config("mail sender address not configured"));
        }

        debug!(
            recipient = %request.to_address,
            recipient_name = request.to_name.as_deref().unwrap_or(""),
            template = template_id,
            "composing email"
        );

        // 渲染对同一输入是确定性的，失败直接上抛，不进入重试
        let html_body = self.templates.render(template_id, &request.data)?;
        let email = ComposedEmail {
            from: self.config.sender_mailbox(),
            to: request.to_address.clone(),
            subject: subject.to_string(),
            html_body,
        };

        self.deliver_with_retry(&email).await?;
        info!(recipient = %request.to_address, subject, "✓ email sent");
        Ok(())
    }

    /// 投递重试循环
    ///
    /// 同一组装结果逐次提交给传输；第 n 次重试前等待 `n * base_delay`，
    /// 最后一次尝试之后不再等待。
    async fn deliver_with_retry(&self, email: &ComposedEmail) -> Result<(), NotifyError> {
        let max_attempts = self.config.retry.effective_attempts();
        let mut last_cause = String::new();

        for attempt in 1..=max_attempts {
            if self.is_cancelled() {
                return Err(NotifyError::interrupted(&email.to));
            }

            match self.transport.send(email).await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(recipient = %email.to, attempt, "email sent successfully on retry");
                    }
                    return Ok(());
                }
                Err(e) => {
                    last_cause = e.to_string();
                    if attempt < max_attempts {
                        let delay = self.config.retry.backoff_delay(attempt);
                        warn!(
                            recipient = %email.to,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "email send attempt failed, retrying"
                        );
                        self.wait_or_cancel(delay, &email.to).await?;
                    }
                }
            }
        }

        error!(
            recipient = %email.to,
            attempts = max_attempts,
            "failed to send email after exhausting all attempts"
        );
        Err(NotifyError::delivery(&email.to, max_attempts, last_cause))
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    async fn wait_or_cancel(&self, delay: Duration, recipient: &str) -> Result<(), NotifyError> {
        match &self.shutdown {
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Some(rx) => {
                let mut rx = rx.clone();
                tokio::select! {
                    _ = tokio::time::sleep(delay) => Ok(()),
                    _ = rx.changed() => Err(NotifyError::interrupted(recipient)),
                }
            }
        }
    }
}
