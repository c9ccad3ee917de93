use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. `RUST_LOG` takes precedence over `verbose`.
///
/// With `json` set, events are written as one JSON object per line, which
/// is what log shippers in front of the service expect.
pub fn init_logging(verbose: bool, json: bool) {
    let (level_filter, level) = if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::OFF, "off")
    };
    let app_filter = Targets::new().with_target("ledger_analyzer", level_filter);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let format_layer = if json {
        fmt::layer().json().with_current_span(true).boxed()
    } else {
        fmt::layer().pretty().without_time().boxed()
    };

    tracing_subscriber::registry()
        .with(format_layer)
        .with(app_filter)
        .with(env_filter)
        .init();
}
