use tracing_subscriber::EnvFilter;

/// Logs go to stderr; `RUST_LOG` adds to the default `octograph=info`.
pub fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("octograph=info".parse().unwrap_or_else(|_| "info".parse().unwrap()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
