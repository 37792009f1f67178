//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use redirect_gateway::{ConfigStore, Gateway, GatewayConfig, Shutdown};
use tempfile::TempDir;

/// A gateway serving on an ephemeral port with its routing file in a temp dir.
#[allow(dead_code)]
pub struct TestGateway {
    pub addr: SocketAddr,
    pub routes_path: PathBuf,
    pub store: Arc<ConfigStore>,
    pub shutdown: Shutdown,
    _dir: TempDir,
}

#[allow(dead_code)]
impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn write_routes(&self, contents: &str) {
        std::fs::write(&self.routes_path, contents).unwrap();
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway with the given routing file contents.
pub async fn start_gateway(routes: &str, watch: bool) -> TestGateway {
    let dir = TempDir::new().unwrap();
    let routes_path = dir.path().join("config.json");
    std::fs::write(&routes_path, routes).unwrap();

    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.routes.path = routes_path.display().to_string();
    config.routes.watch = watch;
    config.routes.debounce_ms = 20;
    config.geoip.enabled = false;

    let shutdown = Shutdown::new();
    let gateway = Gateway::start(config, &shutdown).unwrap();
    let store = Arc::clone(gateway.store());
    let listener = gateway.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = gateway.serve(listener, server_shutdown).await;
    });

    TestGateway {
        addr,
        routes_path,
        store,
        shutdown,
        _dir: dir,
    }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `check` until it returns true or `timeout` passes.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
