//! Structured logging via `tracing`.
//!
//! Events go to stderr so stdout carries only the command summary. The filter
//! comes from `PATCH_MANIFEST_LOG` when set, otherwise from the CLI verbosity.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{ManifestError, Result};

pub const LOG_ENV_VAR: &str = "PATCH_MANIFEST_LOG";

/// Map `-v` counts and `--quiet` to a filter directive.
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn build_env_filter(default_level: &str) -> Result<EnvFilter> {
    match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .map_err(|e| ManifestError::Config(format!("invalid {}: {}", LOG_ENV_VAR, e))),
        _ => EnvFilter::try_new(default_level)
            .map_err(|e| ManifestError::Config(format!("invalid log level: {}", e))),
    }
}

pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = build_env_filter(level_for(verbose, quiet))?;

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| ManifestError::Config(format!("failed to install logger: {}", e)))
}
