// src/logging.rs

//! Subscriber setup for the `searchtrace` binary.
//!
//! `--log-level` sets the level for this crate only; dependencies stay at
//! `warn`. Without the flag, `SEARCHTRACE_LOG` is read as a full
//! `EnvFilter` directive string, so per-module filters such as
//! `searchtrace::trace=trace` work. Falls back to `info`.
//!
//! Logs go to stderr; stdout carries only the solve summary.

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "SEARCHTRACE_LOG";

impl From<LogLevel> for LevelFilter {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Build the filter without installing anything.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Result<EnvFilter> {
    if let Some(lvl) = cli_level {
        let directive = format!("warn,searchtrace={}", LevelFilter::from(lvl));
        return Ok(EnvFilter::new(directive));
    }

    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => EnvFilter::try_new(spec)
            .with_context(|| format!("invalid {LOG_ENV_VAR} value '{spec}'")),
        None => Ok(EnvFilter::new("info")),
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env_value.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_scopes_level_to_this_crate() {
        let filter = build_filter(Some(LogLevel::Debug), Some("trace")).unwrap();
        let rendered = filter.to_string().to_lowercase();
        assert!(rendered.contains("searchtrace=debug"), "{rendered}");
    }

    #[test]
    fn env_value_accepts_module_directives() {
        let filter = build_filter(None, Some("searchtrace::trace=trace")).unwrap();
        assert!(
            filter
                .to_string()
                .to_lowercase()
                .contains("searchtrace::trace=trace")
        );
    }

    #[test]
    fn garbage_env_value_is_rejected() {
        assert!(build_filter(None, Some("searchtrace=loudest")).is_err());
    }

    #[test]
    fn blank_env_value_falls_back_to_info() {
        let filter = build_filter(None, Some("  ")).unwrap();
        assert_eq!(filter.to_string().to_lowercase(), "info");
    }
}
