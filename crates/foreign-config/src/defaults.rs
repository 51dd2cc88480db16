use crate::logging::LogFormat;
use crate::policy::UnsupportedPolicy;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default time, in milliseconds, granted to in-flight deferred calls on
/// shutdown.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default handling of recognised but unimplemented request kinds.
#[must_use]
pub const fn default_unsupported_policy() -> UnsupportedPolicy {
    UnsupportedPolicy::Ignore
}

/// Default shutdown grace period in milliseconds.
#[must_use]
pub const fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}
