use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Acquisition metrics
    pub static ref FETCH_ATTEMPTS: IntCounterVec = IntCounterVec::new(
        Opts::new("fetch_attempts_total", "Fetch attempts per source"),
        &["source"]
    ).unwrap();

    pub static ref FETCH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("fetch_failures_total", "Failed fetch attempts per source and error kind"),
        &["source", "kind"]
    ).unwrap();

    pub static ref FALLBACK_SAMPLES: IntCounter = IntCounter::new(
        "fallback_samples_total",
        "Samples synthesized after every source failed"
    ).unwrap();

    // Session metrics
    pub static ref UPDATES_LOGGED: IntCounter = IntCounter::new(
        "updates_logged_total",
        "Updates recorded into a session"
    ).unwrap();

    pub static ref PERSISTENCE_FAILURES: IntCounter = IntCounter::new(
        "persistence_failures_total",
        "State or daily log writes that failed"
    ).unwrap();

    pub static ref SKIPPED_TICKS: IntCounter = IntCounter::new(
        "skipped_ticks_total",
        "Scheduler ticks skipped because the previous tick was still running"
    ).unwrap();

    // Latency metrics
    pub static ref FETCH_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "fetch_latency_seconds",
            "Single fetch attempt latency"
        ).buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
    ).unwrap();
}

/// Registers every collector with [`REGISTRY`]. Calling it twice only logs
/// the duplicate registrations.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(FETCH_ATTEMPTS.clone()),
        Box::new(FETCH_FAILURES.clone()),
        Box::new(FALLBACK_SAMPLES.clone()),
        Box::new(UPDATES_LOGGED.clone()),
        Box::new(PERSISTENCE_FAILURES.clone()),
        Box::new(SKIPPED_TICKS.clone()),
        Box::new(FETCH_LATENCY.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            tracing::debug!(error = %e, "Metric registration skipped");
        }
    }
}

/// Text exposition of everything in [`REGISTRY`].
pub fn render_metrics() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::debug!(error = %e, "Metric encoding failed");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
