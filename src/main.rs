//! Concord CLI entry point

fn main() {
    // Structured logging with env-based filter; `-v` raises the default from info to debug
    let verbose = std::env::args().any(|a| a == "-v" || a == "--verbose");
    let default_filter = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    concord::cli::run();
}
