use std::sync::Arc;

use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use scholar_notify::api::{create_router, AppState};
use scholar_notify::config::AppConfig;
use scholar_notify::email::{EmailService, SmtpMailTransport};
use scholar_notify::infrastructure::{setup_logging, LoggingConfig};
use scholar_notify::notification::AppNotificationService;
use scholar_notify::storage::SqliteNotificationStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging(LoggingConfig::default())?;

    let config = AppConfig::from_env()?;
    info!("starting scholar-notify");

    let store = SqliteNotificationStore::new(&config.database_url).await?;
    let notifications = Arc::new(AppNotificationService::new(Arc::new(store)));

    // 关闭信号: 触发后正在退避等待的投递会以 Interrupted 终止
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let transport = Arc::new(SmtpMailTransport::new(&config.email)?);
    let mailer = Arc::new(
        EmailService::new(config.email.clone(), transport).with_shutdown(shutdown_rx),
    );

    let state = AppState::new(notifications, mailer);
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!(addr = %config.bind_addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}
