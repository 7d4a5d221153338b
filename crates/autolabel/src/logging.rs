//! Logging setup.
//!
//! Logs always go to stderr; stdout carries the frequency table.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map a configured level onto a default filter directive.
///
/// `verbose` raises anything quieter than debug to debug.
fn default_directive(level: &str, verbose: bool) -> &'static str {
    match level {
        "trace" => "trace",
        "debug" => "debug",
        _ if verbose => "debug",
        "error" => "error",
        "warn" => "warn",
        _ => "info",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str, verbose: bool, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level, verbose)));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from `[logging]`, with CLI flags taking precedence.
pub fn init_from_config(config: &autolabel_core::Config, verbose: bool, json_logs: bool) {
    let json_format = json_logs || config.logging.format == "json";
    init(&config.logging.level, verbose, json_format);
}
