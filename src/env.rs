//! Environment variables read by [`FlogConfig::from_env`](crate::config::FlogConfig::from_env).
//!
//! These are read once at startup; nothing in the logging path touches
//! the environment afterwards.

/// Overrides the `origin` of every record.
pub const SYSLOG_ORIGIN_ENV: &str = "SYSLOG_ORIGIN";

/// Default minimum severity for newly created loggers, e.g. `info`.
pub const FLOG_LEVEL_ENV: &str = "FLOG_LEVEL";

/// Syslog facility name, e.g. `local0` (the default).
pub const SYSLOG_FACILITY_ENV: &str = "SYSLOG_FACILITY";

/// When set to any value, primary loggers always write files.
pub const FLOG_NOT_SYSLOG_ENV: &str = "FLOG_NOT_SYSLOG";

/// Deployment mode; `production` and `staging` select syslog.
pub const FLOG_ENV: &str = "FLOG_ENV";

/// Marker file whose existence selects syslog outside production.
pub const SYSLOG_SENTINEL_PATH: &str = "tmp/flog_using_syslog";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating unset and non-unicode alike.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
