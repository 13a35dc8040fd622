//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are pushed from
//! middleware as responses complete. Domain-level gauges are pulled: the
//! `/metrics` handler in `lib.rs` takes a [`DomainSample`] of the stores
//! and hands it to [`ApiMetrics::observe_domain`] on each scrape.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use uuid::Uuid;

const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Point-in-time counts read from the in-memory stores at scrape time.
#[derive(Debug, Clone, Default)]
pub struct DomainSample {
    pub snapshots: usize,
    pub scored_scopes: usize,
    pub open_tasks: usize,
    pub completed_tasks: usize,
    pub open_risks: usize,
    pub mitigated_risks: usize,
    /// Open risks keyed by severity label (`high`, `medium`, `low`).
    pub open_by_severity: Vec<(&'static str, usize)>,
}

/// Shared metrics handle backed by a Prometheus registry.
///
/// Cloning is cheap and all clones feed the same registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,
    snapshots_total: Gauge,
    scored_scopes_total: Gauge,
    mirrored_tasks_total: GaugeVec,
    mirrored_risks_total: GaugeVec,
    open_risks: GaugeVec,
}

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let metric = IntCounterVec::new(Opts::new(name, help), labels).expect("valid metric definition");
    registry
        .register(Box::new(metric.clone()))
        .expect("unique metric name");
    metric
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Gauge {
    let metric = Gauge::new(name, help).expect("valid metric definition");
    registry
        .register(Box::new(metric.clone()))
        .expect("unique metric name");
    metric
}

fn gauge_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> GaugeVec {
    let metric = GaugeVec::new(Opts::new(name, help), labels).expect("valid metric definition");
    registry
        .register(Box::new(metric.clone()))
        .expect("unique metric name");
    metric
}

/// Sum a labelled counter across every label combination.
fn counter_sum(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|metric| metric.get_counter().get_value() as u64)
        .sum()
}

impl ApiMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "veris_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "path"],
        )
        .expect("valid metric definition");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("unique metric name");

        let inner = Inner {
            http_requests_total: counter_vec(
                &registry,
                "veris_http_requests_total",
                "HTTP requests served",
                &["method", "path", "status"],
            ),
            http_errors_total: counter_vec(
                &registry,
                "veris_http_errors_total",
                "HTTP responses with a 4xx or 5xx status",
                &["method", "path", "status"],
            ),
            snapshots_total: gauge(
                &registry,
                "veris_snapshots_total",
                "Recorded risk score snapshots",
            ),
            scored_scopes_total: gauge(
                &registry,
                "veris_scored_scopes_total",
                "Distinct scopes with at least one snapshot",
            ),
            mirrored_tasks_total: gauge_vec(
                &registry,
                "veris_mirrored_tasks_total",
                "Mirrored tasks by status",
                &["status"],
            ),
            mirrored_risks_total: gauge_vec(
                &registry,
                "veris_mirrored_risks_total",
                "Mirrored risks by status",
                &["status"],
            ),
            open_risks: gauge_vec(
                &registry,
                "veris_open_risks",
                "Open mirrored risks by severity",
                &["severity"],
            ),
            http_request_duration_seconds,
            registry,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Total requests recorded so far, summed over all labels.
    pub fn requests(&self) -> u64 {
        counter_sum(&self.inner.http_requests_total)
    }

    /// Total 4xx/5xx responses recorded so far, summed over all labels.
    pub fn errors(&self) -> u64 {
        counter_sum(&self.inner.http_errors_total)
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_label = status.to_string();
        let inner = &self.inner;

        inner
            .http_requests_total
            .with_label_values(&[method, path, &status_label])
            .inc();
        inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            inner
                .http_errors_total
                .with_label_values(&[method, path, &status_label])
                .inc();
        }
    }

    /// Overwrite every domain gauge from a fresh store sample.
    ///
    /// Labelled gauges are reset first so labels that disappeared from
    /// the stores do not linger at their previous value.
    pub fn observe_domain(&self, sample: &DomainSample) {
        let inner = &self.inner;

        inner.snapshots_total.set(sample.snapshots as f64);
        inner.scored_scopes_total.set(sample.scored_scopes as f64);

        inner.mirrored_tasks_total.reset();
        inner
            .mirrored_tasks_total
            .with_label_values(&["open"])
            .set(sample.open_tasks as f64);
        inner
            .mirrored_tasks_total
            .with_label_values(&["completed"])
            .set(sample.completed_tasks as f64);

        inner.mirrored_risks_total.reset();
        inner
            .mirrored_risks_total
            .with_label_values(&["open"])
            .set(sample.open_risks as f64);
        inner
            .mirrored_risks_total
            .with_label_values(&["mitigated"])
            .set(sample.mitigated_risks as f64);

        inner.open_risks.reset();
        for &(severity, count) in &sample.open_by_severity {
            inner
                .open_risks
                .with_label_values(&[severity])
                .set(count as f64);
        }
    }

    /// Encode the whole registry in Prometheus text exposition format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.inner.registry.gather(), &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

/// Replace UUID path segments with `{id}` to cap label cardinality.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            // Length guard avoids parsing every ordinary segment.
            if matches!(segment.len(), 32 | 36) && Uuid::try_parse(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Axum middleware recording one observation per completed request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(metrics) = metrics {
        metrics.record_request(
            &method,
            &path,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }

    response
}
