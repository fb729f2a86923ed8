//! Structured logging setup.
//!
//! Logs go to standard error; standard output carries tool output only.

use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `forward_flows=info` (or `forward_flows=debug` when `verbose`)
/// when `RUST_LOG` is not set. Call once at program startup; subsequent
/// calls are silently ignored by `tracing_subscriber`.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "forward_flows=debug"
    } else {
        "forward_flows=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_does_not_panic() {
        init_logging(false);
        // Second call should also not panic (try_init ignores re-init).
        init_logging(true);
    }
}
