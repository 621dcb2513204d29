// ============================
// crates/backend-bin/src/main.rs
// ============================
//! `warden` binary: runs either the auth service or the gateway.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use warden_lib::{
    auth_router,
    config::{Settings, DEFAULT_CONFIG_FILE},
    gateway::{self, GatewayState},
    logging::init_tracing,
    AppState,
};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Identity platform: credential auth service and API gateway")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "WARDEN_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    service: Service,
}

#[derive(Subcommand)]
enum Service {
    /// Run the auth service (/signup, /login)
    Auth,
    /// Run the gateway in front of the configured upstreams
    Gateway,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside local development
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    settings.validate()?;
    init_tracing(&settings.logging)?;

    match cli.service {
        Service::Auth => run_auth(settings).await,
        Service::Gateway => run_gateway(settings).await,
    }
}

async fn run_auth(settings: Settings) -> anyhow::Result<()> {
    let addr = settings.auth.bind_addr;
    let state = AppState::new(settings).context("initialising auth service")?;
    let app = auth_router::create_router(Arc::new(state));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "auth service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("auth service failed")?;

    info!("auth service stopped");
    Ok(())
}

async fn run_gateway(settings: Settings) -> anyhow::Result<()> {
    let addr = settings.gateway.bind_addr;
    let state = GatewayState::new(&settings.gateway).context("initialising gateway")?;

    for route in state.routes.entries() {
        info!(route = %route.name, prefix = %route.prefix, upstream = %route.upstream, "route registered");
    }

    let app = gateway::create_router(Arc::new(state));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "gateway listening");

    // Peer addresses feed X-Forwarded-For
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway failed")?;

    info!("gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
