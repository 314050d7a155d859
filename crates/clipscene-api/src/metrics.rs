//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder and return a handle to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "clipscene_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "clipscene_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "clipscene_http_requests_in_flight";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Collapse identifier segments so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut segments = path.split('/');
    while let Some(segment) = segments.next() {
        out.push(segment.to_string());
        let placeholder = match segment {
            "video" => ":video_id",
            "job" | "download" => ":job_id",
            "downloads" => ":file",
            _ => continue,
        };
        if segments.next().is_some() {
            out.push(placeholder.to_string());
        }
        if segment == "downloads" {
            break;
        }
    }
    out.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/job/4f1c2b"), "/job/:job_id");
        assert_eq!(sanitize_path("/download/4f1c2b"), "/download/:job_id");
        assert_eq!(sanitize_path("/video/abc"), "/video/:video_id");
        assert_eq!(
            sanitize_path("/downloads/abc_clip01_Intro.mp4"),
            "/downloads/:file"
        );
        assert_eq!(sanitize_path("/videos"), "/videos");
        assert_eq!(sanitize_path("/"), "/");
    }
}
