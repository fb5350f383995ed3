use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SHEDKIT_LOG";

/// Installs the stderr subscriber. `SHEDKIT_LOG` wins over `-v` flags.
pub(crate) fn init(verbosity: u8) -> Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|err| anyhow!("invalid {LOG_ENV} value: {err}"))?,
        _ => EnvFilter::new(default_directive(verbosity)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

pub(crate) fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
