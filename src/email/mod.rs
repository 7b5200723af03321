pub mod retry;
pub mod service;
pub mod templates;
pub mod transport;

pub use retry::RetryPolicy;
pub use service::{EmailRequest, EmailService};
pub use templates::TemplateEngine;
pub use transport::{ComposedEmail, MailTransport, SmtpMailTransport};
