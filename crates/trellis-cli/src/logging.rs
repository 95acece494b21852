/// Logging configuration and initialization
///
/// Console output goes to stderr so command output on stdout stays clean. A
/// log directory adds a daily rolling JSON file.
use std::path::Path;

use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, registry::Registry, util::SubscriberInitExt, EnvFilter};

/// Initialize console logging with optional file output.
///
/// `RUST_LOG` wins over `default_filter`. Calling this twice fails because a
/// global subscriber is already set.
///
/// # Example
/// ```ignore
/// init_logging("warn", Some(Path::new("./logs")))?;
/// ```
pub fn init_logging(default_filter: &str, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let registry = Registry::default().with(env_filter).with(console_layer);

    match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = rolling::daily(log_dir, "trellis.log");
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file_appender)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .try_init()?;
        }
        None => registry.try_init()?,
    }

    Ok(())
}
