use std::io;

/// Errors raised while constructing loggers or parsing configuration.
///
/// Everything here is a setup-time failure. Emission-time problems
/// (a full disk, an unreachable syslog daemon) never surface as a
/// `FlogError`; the logger reports them through `tracing` and moves on.
#[derive(thiserror::Error, Debug)]
pub enum FlogError {
    /// The requested file target can never be written to, e.g. an empty
    /// path or a path that names a directory.
    #[error("invalid sink target {target}: {reason}")]
    InvalidSinkTarget { target: String, reason: &'static str },

    /// The target directory or file could not be created or opened.
    #[error("sink unavailable at {target}: {source}")]
    SinkUnavailable {
        target: String,
        #[source]
        source: io::Error,
    },

    /// A severity name outside the fixed set.
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
}

pub type Result<T> = std::result::Result<T, FlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = FlogError::UnknownSeverity("verbose".into());
        assert_eq!(err.to_string(), "unknown severity: verbose");

        let err = FlogError::InvalidSinkTarget {
            target: "".into(),
            reason: "empty path",
        };
        assert_eq!(err.to_string(), "invalid sink target : empty path");

        let err = FlogError::SinkUnavailable {
            target: "log/flog".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "sink unavailable at log/flog: denied");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FlogError>();
    }
}
