//! Request metrics middleware.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::metrics::{HttpLabels, HttpLabelsWithStatus, HttpMethod, Metrics};

/// Records request count, latency and in-flight requests.
///
/// The endpoint label is the matched route template (`/api/article/{slug}`),
/// never the raw path, so label cardinality stays bounded.
pub(crate) async fn track_metrics(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = HttpMethod::from(request.method());
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    metrics.http_requests_in_flight.inc();
    let start = Instant::now();
    let response = next.run(request).await;
    metrics.http_requests_in_flight.dec();

    metrics
        .http_request_duration_seconds
        .get_or_create(&HttpLabels {
            method: method.clone(),
            endpoint: endpoint.clone(),
        })
        .observe(start.elapsed().as_secs_f64());
    metrics
        .http_requests_total
        .get_or_create(&HttpLabelsWithStatus {
            method,
            endpoint,
            status: response.status().as_u16(),
        })
        .inc();

    response
}
