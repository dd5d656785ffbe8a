//! Wiring shared by the `docflow` and `docflow-trigger` binaries.

pub mod server;
pub mod setup;

use docflow_core::LogFormat;

/// Initialize tracing for the binaries. Logs go to stderr so stdout only
/// carries the payload.
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docflow=info,tower_http=info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}
