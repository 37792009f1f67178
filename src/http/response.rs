//! Response rendering.
//!
//! # Responsibilities
//! - Turn a `RedirectOutcome` into a 301/302 with `Location`, or a 400
//! - Keep client-facing error bodies free of internal detail
//!
//! # Design Decisions
//! - Every failure renders the same 400 body
//! - Cache-busting headers are added by a layer in server.rs, not here

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::routing::resolver::RedirectOutcome;
use crate::routing::table::RedirectKind;

/// Body of every 400 response.
pub const BAD_REQUEST_BODY: &str = "Request is wrong";

pub fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, BAD_REQUEST_BODY).into_response()
}

pub fn redirect(kind: RedirectKind, location: &str) -> Response {
    let Ok(value) = HeaderValue::from_str(location) else {
        tracing::warn!(location = %location, "Redirect target is not a valid header value");
        return bad_request();
    };

    (
        kind.status(),
        [(header::LOCATION, value)],
        format!("Redirecting to new location... {}", location),
    )
        .into_response()
}

pub fn render(outcome: &RedirectOutcome) -> Response {
    match outcome {
        RedirectOutcome::Redirect { kind, location } => redirect(*kind, location),
        RedirectOutcome::NoRoute(_) => bad_request(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::resolver::NoRouteReason;

    #[test]
    fn permanent_redirect_sets_location() {
        let response = redirect(RedirectKind::Permanent, "https://example.com/new");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/new");
    }

    #[test]
    fn temporary_redirect_is_302() {
        let response = redirect(RedirectKind::Temporary, "https://example.com");
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[test]
    fn no_route_is_bad_request() {
        let response = render(&RedirectOutcome::NoRoute(NoRouteReason::UnknownHost));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn unencodable_location_is_bad_request() {
        let response = redirect(RedirectKind::Permanent, "https://example.com/\nsplit");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
