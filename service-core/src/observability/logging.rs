use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. Local runs get human-readable
/// output; everything else emits flattened JSON lines for log collection.
pub fn init_tracing(service_name: &str, log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let is_local = std::env::var("IS_LOCAL").map(|v| v == "true").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if is_local {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            )
            .init();
    }

    tracing::debug!(service = service_name, "Tracing initialized");
}
