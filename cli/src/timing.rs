//! Tracing setup for the CLI.
//!
//! Library crates log through `log`; `tracing-subscriber`'s default
//! `tracing-log` bridge picks those records up. With `--timing`, spans from
//! `#[instrument]` command entry points log their duration when they close.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

fn default_level(verbose: bool, timing: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else if timing {
        // Span close events are logged at INFO level
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Installs the global subscriber. `RUST_LOG` still wins over the flags.
pub fn init_tracing(verbose: bool, timing: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, timing).into())
        .from_env_lossy();

    let span_events = if timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_level(true)
                .with_span_events(span_events)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
