pub mod admin_routes;
pub mod client_ip;
pub mod config;
pub mod error;
pub mod event_routes;
pub mod events;
pub mod health;
pub mod repository;
pub mod routing;
pub mod security;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use launchgate_rules::{load_store, RuleStore};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use config::GatewayConfig;
use events::EventStore;
use repository::SqliteStore;
use routing::{build_router, GatewayState};

/// Stores backing a running gateway.
#[derive(Clone)]
pub struct GatewayServices {
    pub rules: Arc<dyn RuleStore>,
    pub events: Arc<dyn EventStore>,
}

impl GatewayServices {
    /// Opens the configured database. Rules come from `rules_path` when set,
    /// otherwise from the database; events are always persisted there.
    pub async fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let store = SqliteStore::from_config(&config.core)
            .await
            .context("failed to open the LaunchGate database")?;

        let rules: Arc<dyn RuleStore> = match &config.core.rules_path {
            Some(path) => {
                let memory = load_store(path)
                    .with_context(|| format!("failed to load rules from {}", path.display()))?;
                info!(path = %path.display(), rules = memory.len(), "serving rules from file");
                Arc::new(memory)
            }
            None => Arc::new(store.clone()),
        };

        Ok(Self {
            rules,
            events: Arc::new(store),
        })
    }
}

/// Handle returned when the gateway is started programmatically.
pub struct GatewayHandle {
    pub addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
}

impl GatewayHandle {
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
    }
}

pub async fn start_gateway(config: GatewayConfig) -> anyhow::Result<GatewayHandle> {
    let services = GatewayServices::from_config(&config).await?;
    start_gateway_with(config, services).await
}

/// Serves the gateway over plain HTTP on the configured address using the given stores.
pub async fn start_gateway_with(
    config: GatewayConfig,
    services: GatewayServices,
) -> anyhow::Result<GatewayHandle> {
    if config.tls().is_some() {
        bail!("programmatic gateway startup does not support TLS");
    }

    let state = GatewayState::new(services.rules, services.events, &config);
    let router = build_router(state);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid gateway bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind gateway listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;
    info!(%actual_addr, "starting launchgate-gateway");

    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = rx.await;
        })
        .await
        .ok();
    });

    Ok(GatewayHandle {
        addr: actual_addr,
        shutdown: tx,
    })
}
