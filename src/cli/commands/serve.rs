use clap::Args;

use crate::api::app;
use crate::config::{config, AppConfig};
use crate::state::{AppState, Backends};

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (defaults to the configured port)")]
    pub port: Option<u16>,

    #[arg(long, help = "Use in-process tables and bucket instead of AWS")]
    pub in_memory: bool,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    run_server(config(), args).await
}

/// Build the client handles and serve until interrupted
pub async fn run_server(config: &AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    tracing::info!("Starting Roster API in {:?} mode", config.environment);

    if config.security.verify_jwt && config.security.jwt_secret.is_none() {
        anyhow::bail!("JWT_SECRET is required when SECURITY_VERIFY_JWT is on");
    }
    if !config.security.verify_jwt {
        tracing::warn!("Bearer token signatures are not verified; only run behind a verifying gateway");
    }

    let backends = if args.in_memory {
        tracing::warn!("Serving from in-memory storage; data is lost on exit");
        Backends::in_memory(&config.tables, 100).0
    } else {
        Backends::from_config(config).await
    };

    let state = AppState::new(config, &backends);
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Roster API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Roster API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
