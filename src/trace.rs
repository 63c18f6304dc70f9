use std::sync::Once;

use tracing_subscriber::{EnvFilter, prelude::*};

use crate::settings::LogFormat;

static INIT: Once = Once::new();

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing once: a fmt layer, human-readable text or structured
/// JSON per `log_format`, filtered by `RUST_LOG`. Later calls are no-ops.
pub fn init(log_format: LogFormat) {
    INIT.call_once(|| {
        let env_filter = build_env_filter();
        match log_format {
            LogFormat::Text => {
                tracing_subscriber::registry()
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_target(true)
                            .with_level(true)
                            .compact()
                            .with_filter(env_filter),
                    )
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_target(true)
                            .with_level(true)
                            .json()
                            .with_filter(env_filter),
                    )
                    .init();
            }
        }
    });
}

/// Run an async test body with a tracing subscriber installed.
pub async fn with_test_tracing<F, Fut, T>(_test_name: &str, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    init(LogFormat::Text);
    f().await
}

/// Sync equivalent of [`with_test_tracing`].
pub fn with_test_tracing_sync<F, T>(_test_name: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    init(LogFormat::Text);
    f()
}
