use std::sync::Arc;

use crate::email::EmailService;
use crate::notification::AppNotificationService;

/// Axum 各路由共享的应用状态
///
/// 邮件服务不暴露 HTTP 端点，挂在状态上供内部协作方调用。
#[derive(Clone)]
pub struct AppState {
    pub notifications: Arc<AppNotificationService>,
    pub mailer: Arc<EmailService>,
}

impl AppState {
    pub fn new(notifications: Arc<AppNotificationService>, mailer: Arc<EmailService>) -> Self {
        Self {
            notifications,
            mailer,
        }
    }
}
