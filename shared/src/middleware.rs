use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use tracing::{field::Empty, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::propagation;

/// Server-side request instruments recorded by [`trace_request`].
#[derive(Clone)]
pub struct HttpMetrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
}

impl HttpMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            requests: meter
                .u64_counter("http.server.request.count")
                .with_description("Number of HTTP requests handled")
                .with_unit("{request}")
                .build(),
            duration: meter
                .f64_histogram("http.server.request.duration")
                .with_description("Duration of HTTP requests")
                .with_unit("s")
                .build(),
        }
    }

    /// Instruments bound to the global meter provider, a no-op until one is installed.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("http-server"))
    }

    fn record(&self, method: &str, route: &str, status: u16, seconds: f64) {
        let attrs = [
            KeyValue::new("http.request.method", method.to_string()),
            KeyValue::new("http.route", route.to_string()),
            KeyValue::new("http.response.status_code", i64::from(status)),
        ];
        self.requests.add(1, &attrs);
        self.duration.record(seconds, &attrs);
    }
}

/// Continues the caller's trace for every inbound request and records request metrics.
pub async fn trace_request(
    State(metrics): State<HttpMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let span = tracing::info_span!(
        "HTTP request",
        otel.name = %format!("{method} {route}"),
        otel.kind = "server",
        http.request.method = %method,
        http.route = %route,
        http.response.status_code = Empty,
        otel.status_code = Empty,
    );
    if let Err(e) = span.set_parent(propagation::extract_context(request.headers())) {
        tracing::debug!(error = ?e, "Ignoring inbound trace context");
    }

    let started = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let status = response.status().as_u16();

    span.record("http.response.status_code", status);
    if status >= 500 {
        span.record("otel.status_code", "ERROR");
    }
    metrics.record(&method, &route, status, started.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData};
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
    use tower::ServiceExt;

    fn attribute<'a>(attrs: impl Iterator<Item = &'a KeyValue>, key: &str) -> String {
        attrs
            .into_iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.to_string())
            .unwrap_or_else(|| panic!("missing attribute {key}"))
    }

    #[tokio::test]
    async fn passes_responses_through() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn_with_state(
                HttpMetrics::global(),
                trace_request,
            ));

        let response = app
            .oneshot(
                axum::http::Request::get("/ping")
                    .header(
                        "traceparent",
                        "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn records_request_count_and_duration_per_route() {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();
        let app = Router::new()
            .route("/items/:id", get(|| async { "item" }))
            .layer(axum::middleware::from_fn_with_state(
                HttpMetrics::new(&provider.meter("test")),
                trace_request,
            ));

        let response = app
            .oneshot(
                axum::http::Request::get("/items/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        provider.force_flush().unwrap();
        let exported = exporter.get_finished_metrics().unwrap();
        let metrics: Vec<_> = exported
            .iter()
            .flat_map(|rm| rm.scope_metrics())
            .flat_map(|sm| sm.metrics())
            .collect();

        let count = metrics
            .iter()
            .find(|m| m.name() == "http.server.request.count")
            .expect("request counter exported");
        let AggregatedMetrics::U64(MetricData::Sum(sum)) = count.data() else {
            panic!("request counter is not a u64 sum");
        };
        let point = sum.data_points().next().expect("one data point");
        assert_eq!(point.value(), 1);
        assert_eq!(attribute(point.attributes(), "http.route"), "/items/:id");
        assert_eq!(attribute(point.attributes(), "http.request.method"), "GET");
        assert_eq!(
            attribute(point.attributes(), "http.response.status_code"),
            "200"
        );

        let duration = metrics
            .iter()
            .find(|m| m.name() == "http.server.request.duration")
            .expect("duration histogram exported");
        let AggregatedMetrics::F64(MetricData::Histogram(histogram)) = duration.data() else {
            panic!("duration is not an f64 histogram");
        };
        let point = histogram.data_points().next().expect("one data point");
        assert_eq!(point.count(), 1);
        assert_eq!(attribute(point.attributes(), "http.route"), "/items/:id");
    }
}
