use docquiz_backend::{
    build_router,
    config::{get_config, init_config},
    AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    init_config()?;
    let config = get_config()?;

    let app_state = AppState::from_config(config)?;

    {
        let state = app_state.clone();
        let period = Duration::from_secs(config.context_poll_secs.max(1));
        tokio::spawn(async move {
            loop {
                if let Err(e) = state
                    .assistant_service
                    .refresh(&state.session_service)
                    .await
                {
                    tracing::error!(error = ?e, "Document context refresh failed");
                }
                tokio::time::sleep(period).await;
            }
        });
    }

    let app = build_router(app_state, config);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
