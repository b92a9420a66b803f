use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_ENV: &str = "GOODNS_LOGLEVEL";

/// Pick the filter directive: `RUST_LOG`, then `GOODNS_LOGLEVEL`, then the CLI level.
pub fn filter_directive(cli_level: &str) -> String {
    std::env::var("RUST_LOG")
        .or_else(|_| std::env::var(LOG_ENV))
        .unwrap_or_else(|_| format!("{}={}", env!("CARGO_CRATE_NAME"), cli_level))
}

/// Logs go to stderr so the report on stdout can be piped.
pub fn initialize_logging(cli_level: &str) {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter_directive(cli_level)));

    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
