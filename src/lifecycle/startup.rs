//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the initial routing table (fatal on failure)
//! - Initialize best-effort subsystems (geo, metrics, file watcher)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast only where serving would be wrong: no routing table, no socket
//! - Watcher and metrics failures are logged and the gateway keeps serving
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::loader::SettingsError;
use crate::config::schema::{GatewayConfig, ObservabilityConfig};
use crate::config::watcher::{ConfigWatcher, Reloader};
use crate::geo::GeoAnnotator;
use crate::http::server::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::routing::resolver::RedirectResolver;
use crate::routing::store::{ConfigStore, StoreError};
use crate::routing::validation::lint;

/// Errors that stop the gateway.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("cannot load initial routing table: {0}")]
    Routes(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A gateway with its routing table loaded, ready to bind and serve.
pub struct Gateway {
    config: GatewayConfig,
    store: Arc<ConfigStore>,
    geo: GeoAnnotator,
    _watcher: Option<RecommendedWatcher>,
}

impl Gateway {
    /// Load the routing table and start background reloading.
    ///
    /// Must be called from within a Tokio runtime when watching is enabled.
    pub fn start(config: GatewayConfig, shutdown: &Shutdown) -> Result<Self, StartupError> {
        let routes_path = Path::new(&config.routes.path);

        let store = Arc::new(ConfigStore::open(routes_path)?);
        let snapshot = store.current();
        tracing::info!(
            path = %routes_path.display(),
            hosts = snapshot.table().len(),
            rules = snapshot.table().rule_count(),
            "Routing table loaded"
        );
        for issue in lint(snapshot.table()) {
            tracing::warn!(issue = %issue, "Routing table issue");
        }
        metrics::set_config_version(snapshot.version());

        let geo = GeoAnnotator::from_config(&config.geoip);

        let watcher = if config.routes.watch {
            start_reloader(
                routes_path,
                Arc::clone(&store),
                Duration::from_millis(config.routes.debounce_ms),
                shutdown.subscribe(),
            )
        } else {
            tracing::info!("Routing file watching disabled");
            None
        };

        Ok(Self {
            config,
            store,
            geo,
            _watcher: watcher,
        })
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Bind the configured listener address.
    pub async fn bind(&self) -> Result<TcpListener, StartupError> {
        let address = &self.config.listener.bind_address;
        let listener = TcpListener::bind(address.as_str()).await.map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

        if let Ok(local_addr) = listener.local_addr() {
            tracing::info!(address = %local_addr, "Server listening");
        }
        Ok(listener)
    }

    /// Serve requests on `listener` until `shutdown` fires.
    pub async fn serve(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
        let state = AppState {
            resolver: RedirectResolver::new(Arc::clone(&self.store)),
            geo: self.geo.clone(),
        };
        let server = HttpServer::new(state, &self.config.timeouts);

        server.run(listener, shutdown).await.map_err(StartupError::Serve)
    }
}

fn start_reloader(
    path: &Path,
    store: Arc<ConfigStore>,
    debounce: Duration,
    shutdown: broadcast::Receiver<()>,
) -> Option<RecommendedWatcher> {
    let (watcher, events) = ConfigWatcher::new(path);
    match watcher.run() {
        Ok(handle) => {
            let reloader = Reloader::new(path, store, debounce);
            tokio::spawn(reloader.run(events, shutdown));
            Some(handle)
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to watch routing file, hot reload disabled"
            );
            None
        }
    }
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let shutdown = Arc::new(Shutdown::new());

    // Recorder first: updates made before it is installed are dropped.
    start_metrics(&config.observability);
    let gateway = Gateway::start(config, &shutdown)?;

    let listener = gateway.bind().await?;

    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        signal_shutdown.trigger();
    });

    let result = gateway.serve(listener, shutdown.subscribe()).await;

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    result
}

fn start_metrics(observability: &ObservabilityConfig) {
    if !observability.metrics_enabled {
        return;
    }
    match observability.metrics_address.parse::<SocketAddr>() {
        Ok(addr) => {
            if let Err(e) = metrics::init_metrics(addr) {
                tracing::error!(error = %e, "Failed to start metrics endpoint");
            }
        }
        Err(e) => tracing::error!(
            metrics_address = %observability.metrics_address,
            error = %e,
            "Failed to parse metrics address"
        ),
    }
}
