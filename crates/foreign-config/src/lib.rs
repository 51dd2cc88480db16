//! Shared configuration for the foreign bridge host.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional configuration file, then `FOREIGN_*` environment variables, then
//! command-line flags. The bridge core itself has no configuration surface;
//! everything here concerns the host process wrapped around it (logging, the
//! handling of unimplemented request kinds, and shutdown behaviour).

mod defaults;
mod logging;
mod policy;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_SHUTDOWN_GRACE_MS, default_log_filter, default_log_filter_string,
    default_log_format, default_shutdown_grace_ms, default_unsupported_policy,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use policy::{UnsupportedPolicy, UnsupportedPolicyParseError};

/// Resolved configuration for the bridge host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FOREIGN")]
pub struct Config {
    /// `tracing` filter expression applied to the host's log output.
    #[ortho_config(default = default_log_filter_string())]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for log records written to stderr.
    #[ortho_config(default = default_log_format())]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Handling of `New`, `Create`, and `InvokeOn` requests.
    #[ortho_config(default = default_unsupported_policy())]
    #[serde(default = "default_unsupported_policy")]
    pub unsupported_kinds: UnsupportedPolicy,
    /// Milliseconds granted to in-flight deferred calls during shutdown.
    #[ortho_config(default = default_shutdown_grace_ms())]
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            unsupported_kinds: default_unsupported_policy(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the policy for recognised but unimplemented request kinds.
    #[must_use]
    pub const fn unsupported_kinds(&self) -> UnsupportedPolicy {
        self.unsupported_kinds
    }

    /// Returns the shutdown grace period.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.unsupported_kinds(), UnsupportedPolicy::Ignore);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
    }

    #[test]
    fn log_format_round_trips_through_text() {
        let format: LogFormat = "COMPACT".parse().expect("parse compact");
        assert_eq!(format, LogFormat::Compact);
        assert_eq!(format.to_string(), "compact");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults_when_deserialising() {
        let config: Config =
            serde_json::from_str(r#"{"unsupported_kinds":"reply"}"#).expect("deserialise");
        assert_eq!(config.unsupported_kinds(), UnsupportedPolicy::Reply);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.shutdown_grace_ms, DEFAULT_SHUTDOWN_GRACE_MS);
    }
}
