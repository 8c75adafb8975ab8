use airport_models::AirportError;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

fn internal(e: impl std::fmt::Display) -> AirportError {
    AirportError::InternalError {
        reason: e.to_string(),
    }
}

/// Business and HTTP counters, exported in the prometheus text format.
pub struct MetricsService {
    registry: Registry,
    orders_created_total: IntCounter,
    tickets_sold_total: IntCounter,
    users_registered_total: IntCounter,
    auth_failures_total: IntCounter,
    images_uploaded_total: IntCounter,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: Histogram,
}

impl MetricsService {
    pub fn new() -> Result<Self, AirportError> {
        let registry = Registry::new();

        let orders_created_total = IntCounter::new(
            "airport_orders_created_total",
            "Total number of orders created",
        )
        .map_err(internal)?;

        let tickets_sold_total = IntCounter::new(
            "airport_tickets_sold_total",
            "Total number of tickets sold, including replacements",
        )
        .map_err(internal)?;

        let users_registered_total = IntCounter::new(
            "airport_users_registered_total",
            "Total number of registered users",
        )
        .map_err(internal)?;

        let auth_failures_total = IntCounter::new(
            "airport_auth_failures_total",
            "Total number of rejected credentials and tokens",
        )
        .map_err(internal)?;

        let images_uploaded_total = IntCounter::new(
            "airport_images_uploaded_total",
            "Total number of airplane images uploaded",
        )
        .map_err(internal)?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("airport_http_requests_total", "HTTP requests by method and status"),
            &["method", "status"],
        )
        .map_err(internal)?;

        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "airport_http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))
        .map_err(internal)?;

        registry
            .register(Box::new(orders_created_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(tickets_sold_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(users_registered_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(auth_failures_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(images_uploaded_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(http_requests_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .map_err(internal)?;

        Ok(Self {
            registry,
            orders_created_total,
            tickets_sold_total,
            users_registered_total,
            auth_failures_total,
            images_uploaded_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    pub fn record_order_created(&self, tickets: usize) {
        self.orders_created_total.inc();
        self.tickets_sold_total.inc_by(tickets as u64);
    }

    pub fn record_tickets_replaced(&self, tickets: usize) {
        self.tickets_sold_total.inc_by(tickets as u64);
    }

    pub fn record_user_registered(&self) {
        self.users_registered_total.inc();
    }

    pub fn record_auth_failure(&self) {
        self.auth_failures_total.inc();
    }

    pub fn record_image_uploaded(&self) {
        self.images_uploaded_total.inc();
    }

    pub fn record_request(&self, method: &str, status: u16, seconds: f64) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.http_request_duration_seconds.observe(seconds);
    }

    pub fn get_prometheus_metrics(&self) -> Result<String, AirportError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(internal)?;

        String::from_utf8(buffer).map_err(internal)
    }
}
