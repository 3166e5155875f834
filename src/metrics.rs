//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Submission counters
    pub submit_attempts: IntCounter,
    pub submit_rebuilds: IntCounter,
    pub submit_success: IntCounter,
    pub submit_failures: IntCounterVec,

    // Launch counters
    pub launches_total: IntCounter,
    pub launches_failed: IntCounter,
    pub registry_errors: IntCounter,

    // Histograms
    pub submit_latency: Histogram,
    pub http_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let submit_attempts = IntCounter::with_opts(Opts::new(
            "submit_attempts_total",
            "Build/sign/send cycles started, rebuilds included",
        ))?;

        let submit_rebuilds = IntCounter::with_opts(Opts::new(
            "submit_rebuilds_total",
            "Transactions rebuilt after an expired blockhash",
        ))?;

        let submit_success = IntCounter::with_opts(Opts::new(
            "submit_success_total",
            "Submissions confirmed at the requested commitment",
        ))?;

        let submit_failures = IntCounterVec::new(
            Opts::new("submit_failures_total", "Terminal submission failures"),
            &["category"],
        )?;

        let launches_total =
            IntCounter::with_opts(Opts::new("launches_total", "Token launches attempted"))?;

        let launches_failed =
            IntCounter::with_opts(Opts::new("launches_failed", "Token launches that failed"))?;

        let registry_errors = IntCounter::with_opts(Opts::new(
            "registry_errors_total",
            "Failed reads or writes against the launch registry",
        ))?;

        let submit_latency = Histogram::with_opts(
            HistogramOpts::new("submit_latency_seconds", "End-to-end submit latency")
                .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 90.0]),
        )?;

        let http_latency = Histogram::with_opts(
            HistogramOpts::new("http_latency_seconds", "External HTTP service latency")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;

        registry.register(Box::new(submit_attempts.clone()))?;
        registry.register(Box::new(submit_rebuilds.clone()))?;
        registry.register(Box::new(submit_success.clone()))?;
        registry.register(Box::new(submit_failures.clone()))?;
        registry.register(Box::new(launches_total.clone()))?;
        registry.register(Box::new(launches_failed.clone()))?;
        registry.register(Box::new(registry_errors.clone()))?;
        registry.register(Box::new(submit_latency.clone()))?;
        registry.register(Box::new(http_latency.clone()))?;

        Ok(Self {
            registry,
            submit_attempts,
            submit_rebuilds,
            submit_success,
            submit_failures,
            launches_total,
            launches_failed,
            registry_errors,
            submit_latency,
            http_latency,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
