use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` wins over the `info`
/// default. Safe to call more than once.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}

pub fn trace_acquisition() -> Span {
    tracing::info_span!("acquisition")
}

pub fn trace_source_attempt(source: &str, attempt: u32) -> Span {
    tracing::debug_span!(
        "source_attempt",
        source = %source,
        attempt,
    )
}

pub fn trace_tick(session_number: u64) -> Span {
    tracing::info_span!(
        "tick",
        session = session_number,
    )
}
