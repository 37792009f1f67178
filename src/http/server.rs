//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the wildcard redirect handler
//! - Wire up middleware (no-cache headers, tracing, timeout, request ID)
//! - Bind server to listener
//! - Dispatch requests to the redirect resolver
//! - Write one structured access log line per request

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::TimeoutConfig;
use crate::geo::GeoAnnotator;
use crate::http::request::RequestMeta;
use crate::http::response;
use crate::observability::metrics;
use crate::routing::resolver::{RedirectOutcome, RedirectResolver};

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub resolver: RedirectResolver,
    pub geo: GeoAnnotator,
}

/// HTTP server for the redirect gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(state: AppState, timeouts: &TimeoutConfig) -> Self {
        Self {
            router: Self::build_router(state, timeouts),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, timeouts: &TimeoutConfig) -> Router {
        Router::new()
            .route("/", get(redirect_handler))
            .route("/{*path}", get(redirect_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache, no-store, must-revalidate"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::PRAGMA,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::EXPIRES,
                HeaderValue::from_static("0"),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for serving on a custom transport or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wildcard handler: resolve host + path into a redirect.
async fn redirect_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();

    let meta = match RequestMeta::from_request(&request) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::info!(error = %e, uri = %request.uri(), "Wrong request");
            metrics::record_request("malformed", start_time);
            return response::bad_request();
        }
    };

    let geo = state.geo.annotate(&meta.client_ip);
    let outcome = state.resolver.resolve(&meta.host, &meta.path);

    tracing::info!(
        client_ip = %meta.client_ip,
        geo = %geo,
        user_agent = meta.user_agent.as_deref().unwrap_or("-"),
        accept_language = meta.accept_language.as_deref().unwrap_or("-"),
        host = %meta.host,
        port = %meta.port,
        path = %meta.path,
        outcome = outcome.label(),
        "Request"
    );
    if let RedirectOutcome::Redirect { location, .. } = &outcome {
        tracing::debug!(host = %meta.host, path = %meta.path, location = %location, "Redirecting");
    }

    metrics::record_request(outcome.label(), start_time);
    response::render(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use std::sync::{Arc, Mutex};

    use axum::extract::ConnectInfo;
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::geo::{GeoInfo, GeoLookup};
    use crate::routing::store::ConfigStore;

    const CONFIG: &[u8] = br#"{"example.com":{
        "/old":{"persistent":true,"url":"https://example.com/new"},
        "default":{"persistent":false,"url":"https://example.com"}},
        "broken.com":{"/x":{"persistent":true,"url":"https://broken.com/x"},"default":{"persistent":true}}}"#;

    #[derive(Default)]
    struct RecordingLookup {
        seen: Mutex<Vec<IpAddr>>,
    }

    impl GeoLookup for RecordingLookup {
        fn lookup(&self, ip: IpAddr) -> Option<GeoInfo> {
            self.seen.lock().unwrap().push(ip);
            None
        }
    }

    fn app_with_geo(geo: GeoAnnotator) -> Router {
        let store = Arc::new(ConfigStore::bootstrap(CONFIG).unwrap());
        let state = AppState {
            resolver: RedirectResolver::new(store),
            geo,
        };
        HttpServer::new(state, &TimeoutConfig::default()).router()
    }

    fn app() -> Router {
        app_with_geo(GeoAnnotator::disabled())
    }

    fn get(host: &str, uri: &str) -> Request<Body> {
        let mut request = Request::builder()
            .uri(uri)
            .header("Host", host)
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("192.0.2.1:40000".parse::<SocketAddr>().unwrap()));
        request
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_no_cache(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
        assert_eq!(headers[header::PRAGMA], "no-cache");
        assert_eq!(headers[header::EXPIRES], "0");
    }

    #[tokio::test]
    async fn exact_rule_redirects_permanently() {
        let response = app().oneshot(get("example.com", "/old")).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/new");
        assert_no_cache(&response);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn default_rule_redirects_temporarily() {
        let response = app().oneshot(get("example.com:8080", "/missing?q=1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com");
        assert_eq!(body_text(response).await, "Redirecting to new location... https://example.com");
    }

    #[tokio::test]
    async fn unknown_host_is_bad_request() {
        let response = app().oneshot(get("unknown.com", "/old")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_no_cache(&response);
        assert_eq!(body_text(response).await, "Request is wrong");
    }

    #[tokio::test]
    async fn default_without_url_is_bad_request() {
        let response = app().oneshot(get("broken.com", "/elsewhere")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Request is wrong");
    }

    #[tokio::test]
    async fn missing_host_is_bad_request() {
        let request = Request::builder().uri("/old").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn head_is_served_like_get() {
        let mut request = get("example.com", "/old");
        *request.method_mut() = Method::HEAD;

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    }

    #[tokio::test]
    async fn writes_are_not_routed() {
        let mut request = get("example.com", "/old");
        *request.method_mut() = Method::POST;

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn incoming_request_id_is_propagated() {
        let mut request = get("example.com", "/old");
        request.headers_mut().insert("x-request-id", HeaderValue::from_static("abc-123"));

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn geo_lookup_uses_real_ip_and_never_changes_outcome() {
        let lookup = Arc::new(RecordingLookup::default());
        let app = app_with_geo(GeoAnnotator::new(lookup.clone()));

        let mut request = get("example.com", "/old");
        request.headers_mut().insert("x-real-ip", HeaderValue::from_static("203.0.113.9"));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            lookup.seen.lock().unwrap().as_slice(),
            &["203.0.113.9".parse::<IpAddr>().unwrap()]
        );
    }
}
