//! Tower middleware for the HTTP surface.
//!
//! Layers listed first wrap the ones after them, so the request id is set
//! before tracing starts and propagated back onto the response last.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use steprpc_core::messages::{ErrorBody, ErrorResponse};
use tower::ServiceBuilder;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;
use super::shutdown::ShutdownController;

/// Request id header set on every request and echoed on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

type Stack<Inner, Outer> = tower::layer::util::Stack<Inner, Outer>;

/// Composed layer type returned by [`build_http_layers`].
type HttpLayers = Stack<
    PropagateRequestIdLayer,
    Stack<
        CorsLayer,
        Stack<
            CompressionLayer,
            Stack<
                TraceLayer<SharedClassifier<ServerErrorsAsFailures>>,
                Stack<SetRequestIdLayer<MakeRequestUuid>, tower::layer::util::Identity>,
            >,
        >,
    >,
>;

/// Transport middleware, outermost first:
///
/// 1. `SetRequestId` assigns a UUID `x-request-id` when the client sent none
/// 2. `Trace` opens a span per request
/// 3. `Compression` gzips responses
/// 4. `CORS` from `cors_origins`
/// 5. `PropagateRequestId` copies the id onto the response
///
/// The request deadline is not part of this stack; see [`request_timeout_layer`].
#[must_use]
pub fn build_http_layers(config: &NetworkConfig) -> HttpLayers {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config.cors_origins))
        .layer(PropagateRequestIdLayer::new(request_id))
        .into_inner()
}

/// Answers 408 after `request_timeout`.
///
/// Applied per route. `POST /v1/invoke` runs direct operations to
/// completion and is never wrapped in it.
#[must_use]
pub fn request_timeout_layer(config: &NetworkConfig) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, config.request_timeout)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Rejects API requests with 503 once draining starts; otherwise counts the
/// request as in flight until its response is produced.
pub async fn admit_request(
    State(shutdown): State<Arc<ShutdownController>>,
    request: Request,
    next: Next,
) -> Response {
    if !shutdown.health_state().accepts_requests() {
        let body = ErrorResponse {
            error: ErrorBody::new("service_unavailable", "server is shutting down"),
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    }
    let _guard = shutdown.in_flight_guard();
    next.run(request).await
}
