use std::net::SocketAddr;

use anyhow::Context;
use launchgate_gateway::config::GatewayConfig;
use launchgate_gateway::routing::{build_router, GatewayState};
use launchgate_gateway::GatewayServices;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if let Err(err) = launchgate_core::logging::init_tracing(None) {
        eprintln!("failed to initialise tracing: {err}");
    }

    let config = GatewayConfig::from_env().context("failed to load gateway configuration")?;
    let services = GatewayServices::from_config(&config).await?;
    let router = build_router(GatewayState::new(services.rules, services.events, &config));

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid bind address")?;

    if let Some(tls) = config.tls() {
        let tls_config = tls
            .load()
            .await
            .context("failed to load TLS certificates")?;
        info!(%addr, "starting launchgate-gateway with TLS");

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(None);
        });

        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .context("gateway server terminated with TLS error")?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind TCP listener")?;
        let actual_addr = listener
            .local_addr()
            .context("failed to read socket address")?;
        info!(%actual_addr, "starting launchgate-gateway");

        if let Err(err) = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        {
            error!(?err, "gateway server terminated with error");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
