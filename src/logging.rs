//! tracing-subscriber setup shared by the service and the one-shot binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "NEWS_LOG_FORMAT";
const DEFAULT_FILTER: &str = "news_aggregator=info,warn";

/// Install a global subscriber. `RUST_LOG` overrides the default filter;
/// `NEWS_LOG_FORMAT=json` switches to JSON lines.
///
/// Uses `try_init`, so a second call (or a subscriber installed by the
/// runtime) is left alone.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_FORMAT)
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
