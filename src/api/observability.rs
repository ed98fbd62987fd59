use crate::api::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Renders the Prometheus exposition text.
///
/// # Endpoint
/// `GET /api/metrics`
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// What a request touches, read from its route template.
#[derive(Debug, Default, PartialEq, Eq)]
struct RouteContext {
    /// First segment under `/api`, e.g. `library` or `media`
    area: Option<String>,
    /// Value of the route's `{...}` parameter: a scan, assignment, task or record id
    resource_id: Option<String>,
}

fn route_context(template: Option<&str>, path: &str) -> RouteContext {
    let Some(template) = template else {
        return RouteContext::default();
    };

    let mut segments = template.split('/').zip(path.split('/')).skip_while(|(t, _)| t.is_empty());
    let area = match segments.next() {
        Some(("api", _)) => segments.next().map(|(t, _)| t.to_string()),
        Some((t, _)) => Some(t.to_string()),
        None => None,
    };
    let resource_id = template
        .split('/')
        .zip(path.split('/'))
        .find(|(t, _)| t.starts_with('{') && t.ends_with('}'))
        .map(|(_, p)| p.to_string());

    RouteContext { area, resource_id }
}

/// Keeps a caller supplied request id, otherwise mints one.
fn request_id(req: &Request) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

const fn outcome(status: u16) -> &'static str {
    match status {
        500.. => "error",
        400..500 => "client_error",
        _ => "success",
    }
}

/// Request span plus `http_requests_total` and `http_request_duration_seconds`.
/// Spans carry the API area and the scan/assignment/task id the route addresses.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = request_id(&req);
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());
    let context = route_context(route.as_deref(), &path);

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        route = route.as_deref(),
        area = context.area.as_deref(),
        resource_id = context.resource_id.as_deref(),
    );

    async move {
        let mut response = next.run(req).await;
        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // Unmatched requests share one label instead of their raw path.
        let labels = [
            ("method", method),
            ("path", route.unwrap_or_else(|| "unmatched".to_string())),
            ("status", status.to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status >= 500 {
            warn!(event = "http_request_failed", duration_ms, status_code = status, "Request failed");
        } else {
            info!(
                event = "http_request_finished",
                duration_ms,
                status_code = status,
                outcome = outcome(status),
                "Request finished"
            );
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_context_reads_area_and_id() {
        let ctx = route_context(
            Some("/api/media/organize/{assignment_id}"),
            "/api/media/organize/a1b2",
        );
        assert_eq!(ctx.area.as_deref(), Some("media"));
        assert_eq!(ctx.resource_id.as_deref(), Some("a1b2"));

        let ctx = route_context(Some("/api/library/scan/status/{id}"), "/api/library/scan/status/s-9");
        assert_eq!(ctx.area.as_deref(), Some("library"));
        assert_eq!(ctx.resource_id.as_deref(), Some("s-9"));

        let ctx = route_context(Some("/api/tasks"), "/api/tasks");
        assert_eq!(ctx.area.as_deref(), Some("tasks"));
        assert_eq!(ctx.resource_id, None);
    }

    #[test]
    fn test_route_context_outside_api_and_unmatched() {
        let ctx = route_context(Some("/health"), "/health");
        assert_eq!(ctx.area.as_deref(), Some("health"));
        assert_eq!(route_context(None, "/nope"), RouteContext::default());
    }

    #[test]
    fn test_outcome_buckets() {
        assert_eq!(outcome(201), "success");
        assert_eq!(outcome(404), "client_error");
        assert_eq!(outcome(503), "error");
    }
}
