//! Tracing setup shared by the binary and by tests.
//!
//! [`layer`] renders only this library's events (completion calls) with file/line
//! detail; [`init`] installs the process-wide subscriber.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crate target prefix used to filter only library-originated logs.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// RFC3339 UTC timer, e.g. `2025-09-12T10:20:30Z`.
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let s = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Formatting layer that renders ONLY events emitted by this crate.
///
/// Uses a per-layer filter, so it does not affect other crates' output.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let only_this_crate = filter::filter_fn(|meta| meta.target().starts_with(TARGET_PREFIX));

    fmt::layer()
        .with_ansi(io::stdout().is_terminal())
        .event_format(
            fmt::format()
                .compact()
                .with_timer(ChronoRfc3339Utc)
                .with_target(true)
                .with_source_location(true),
        )
        .with_filter(only_this_crate)
}

/// Level directive for this library only, e.g. `ai_llm_service=debug`.
pub fn level_directive(level: Level) -> Option<Directive> {
    let s = format!("{TARGET_PREFIX}={}", level.as_str().to_lowercase());
    Directive::from_str(&s).ok()
}

/// Installs the global subscriber: `RUST_LOG` (or `default`) for the
/// application, plus the library layer for completion events.
///
/// Application events go through a compact layer; events from this crate are
/// rendered only by [`layer`] so they are not printed twice.
///
/// Returns `false` if a global subscriber was already set.
pub fn init(default: &str) -> bool {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if let Some(d) = level_directive(Level::INFO) {
        filter = filter.add_directive(d);
    }

    let app_layer = fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_target(false)
        .with_ansi(io::stdout().is_terminal())
        .compact()
        .with_filter(filter::filter_fn(|meta| {
            !meta.target().starts_with(TARGET_PREFIX)
        }));

    tracing_subscriber::registry()
        .with(filter)
        .with(app_layer)
        .with(layer())
        .try_init()
        .is_ok()
}
