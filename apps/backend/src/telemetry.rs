use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "info,actix_web=info";

/// Install the process-wide tracing subscriber.
///
/// Output is JSON lines on stdout so the log shipper needs no parsing
/// rules. `RUST_LOG` overrides the default directives; `LOG_FORMAT=pretty`
/// switches to human-readable output for local runs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let pretty = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("pretty"));

    let registry = tracing_subscriber::registry().with(filter);
    if pretty {
        registry.with(fmt::layer().with_target(false)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(false)
                    .with_ansi(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .init();
    }
}
