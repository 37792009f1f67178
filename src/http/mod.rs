//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, no-cache + request-id layers)
//!     → request.rs (host, port, path, client ip)
//!     → [routing resolver decides redirect]
//!     → [geo annotator enriches the access log]
//!     → response.rs (301/302 + Location, or 400)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestError, RequestMeta, X_REAL_IP};
pub use server::{AppState, HttpServer};
