use std::net::SocketAddr;

use anyhow::Context;
use dwell::config::get_configuration;
use dwell::kernel::controller::TimerController;
use dwell::kernel::reactor::TimerReactor;
use dwell::server::{app_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!("Dwell Booting...");

    let settings = get_configuration().context("failed to load configuration")?;
    let app_settings = &settings.application;

    // State lives in this process only; a restart discards every timer and session.
    let (reactor, handle) =
        TimerReactor::new(TimerController::in_memory(), app_settings.command_buffer);
    let reactor_task = reactor.spawn();

    let secret = settings.intercom.secret_bytes();
    if secret.is_none() {
        warn!("No intercom.client_secret configured: webhook signatures will NOT be verified");
    }

    let state = AppState::new(handle)
        .with_webhook_secret(secret)
        .with_history_display_limit(app_settings.history_display_limit);
    let app = app_router(state, &app_settings.static_dir);

    let addr: SocketAddr = format!("{}:{}", app_settings.host, app_settings.port)
        .parse()
        .context("invalid host/port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Dwell listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("server error")?;

    reactor_task.abort();
    Ok(())
}
