use anyhow::Context;

use shopreel_api::app::{build_app, services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopreel_observability::init();

    let settings = services::Settings::from_env();
    let (services, orchestrator) = services::build_services(&settings)
        .await
        .context("failed to wire services")?;

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("http server stopped; draining jobs");
    orchestrator.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
