use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;

/// 组装完成的邮件
///
/// 一次投递调用内的所有尝试复用同一份组装结果，不会重新渲染。
#[derive(Debug, Clone)]
pub struct ComposedEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// 邮件传输 trait，负责单次发送尝试
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &ComposedEmail) -> anyhow::Result<()>;
}

/// 基于 lettre 的 SMTP 传输
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// 创建 SMTP 传输
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)?.port(config.smtp_port);

        if !config.username.is_empty() && !config.password.is_empty() {
            let credentials = Credentials::new(config.username.clone(), config.password.clone());
            builder = builder.credentials(credentials);
        }

        builder = builder.pool_config(PoolConfig::new().max_size(10));

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn build_message(email: &ComposedEmail) -> anyhow::Result<Message> {
        let message = Message::builder()
            .from(email.from.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())?;

        Ok(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &ComposedEmail) -> anyhow::Result<()> {
        let message = Self::build_message(email)?;
        self.transport.send(message).await?;
        Ok(())
    }
}
