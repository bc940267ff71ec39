use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber for the CLI.
///
/// `RUST_LOG` wins when set, otherwise `log_level` applies. Output goes to
/// stderr; stdout carries command results.
pub fn init(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
