//! Prometheus metrics for the blog server.

use axum::http::Method;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// Labels for HTTP request metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabelsWithStatus {
    pub method: HttpMethod,
    pub endpoint: String,
    pub status: u16,
}

/// HTTP method label value.
///
/// Covers the methods the blog routes accept. Anything else is answered
/// with `405` and labelled `Other`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
    Other,
}

impl From<&Method> for HttpMethod {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => HttpMethod::Get,
            Method::POST => HttpMethod::Post,
            Method::DELETE => HttpMethod::Delete,
            _ => HttpMethod::Other,
        }
    }
}

/// Labels for the HTTP latency histogram.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: HttpMethod,
    pub endpoint: String,
}

/// Container for all Prometheus metrics.
pub struct Metrics {
    registry: Registry,

    /// Counter of article events appended to the log.
    pub events_appended_total: Counter,

    /// Gauge of open notification streams.
    pub notification_sessions_active: Gauge,

    /// Counter of events written to notification streams.
    pub notification_events_sent_total: Counter,

    /// Counter of events dropped because a notification stream fell behind.
    pub notification_events_missed_total: Counter,

    /// Counter of HTTP requests.
    pub http_requests_total: Family<HttpLabelsWithStatus, Counter>,

    /// Histogram of HTTP request latency in seconds.
    pub http_request_duration_seconds: Family<HttpLabels, Histogram>,

    /// Gauge of currently in-flight requests.
    pub http_requests_in_flight: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let events_appended_total = Counter::default();
        registry.register(
            "events_appended_total",
            "Total number of article events appended to the event log",
            events_appended_total.clone(),
        );

        let notification_sessions_active = Gauge::default();
        registry.register(
            "notification_sessions_active",
            "Number of open notification streams",
            notification_sessions_active.clone(),
        );

        let notification_events_sent_total = Counter::default();
        registry.register(
            "notification_events_sent_total",
            "Total number of events written to notification streams",
            notification_events_sent_total.clone(),
        );

        let notification_events_missed_total = Counter::default();
        registry.register(
            "notification_events_missed_total",
            "Total number of events dropped for lagging notification streams",
            notification_events_missed_total.clone(),
        );

        let http_requests_total = Family::<HttpLabelsWithStatus, Counter>::default();
        registry.register(
            "http_requests_total",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        // buckets from 1ms to ~8s
        let http_request_duration_seconds =
            Family::<HttpLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.001, 2.0, 14))
            });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_requests_in_flight = Gauge::default();
        registry.register(
            "http_requests_in_flight",
            "Number of HTTP requests currently being processed",
            http_requests_in_flight.clone(),
        );

        Self {
            registry,
            events_appended_total,
            notification_sessions_active,
            notification_events_sent_total,
            notification_events_missed_total,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        }
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(err) = prometheus_client::encoding::text::encode(&mut buffer, &self.registry) {
            tracing::error!(error = %err, "Failed to encode metrics");
        }
        buffer
    }
}
