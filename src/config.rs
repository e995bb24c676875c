use std::path::{Path, PathBuf};

use crate::backend::BackendKind;
use crate::env::{
    env_opt, FLOG_ENV, FLOG_LEVEL_ENV, FLOG_NOT_SYSLOG_ENV, SYSLOG_FACILITY_ENV,
    SYSLOG_ORIGIN_ENV, SYSLOG_SENTINEL_PATH,
};
use crate::error::Result;
use crate::file_sink::RotationPolicy;
use crate::severity::Severity;
use crate::syslog::Facility;

/// Logging configuration, resolved once at process startup and handed to
/// [`LoggerFactory`](crate::registry::LoggerFactory).
///
/// **Fields**
/// - `backend`: backend for primary-registry loggers. Monitor loggers
///   always write files.
/// - `root`: directory of primary file loggers.
/// - `monitor_root`: directory of monitor loggers.
/// - `default_level`: threshold for loggers created without an explicit level.
/// - `origin`: `origin` override stamped on every record.
/// - `facility`: syslog facility.
/// - `rotation`: rotation policy of every file sink.
#[derive(Clone, Debug, PartialEq)]
pub struct FlogConfig {
    pub backend: BackendKind,
    pub root: PathBuf,
    pub monitor_root: PathBuf,
    pub default_level: Severity,
    pub origin: Option<String>,
    pub facility: Facility,
    pub rotation: RotationPolicy,
}

impl Default for FlogConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            root: PathBuf::from("log").join("flog"),
            monitor_root: PathBuf::from("log"),
            default_level: Severity::Debug,
            origin: None,
            facility: Facility::Local0,
            rotation: RotationPolicy::default(),
        }
    }
}

impl FlogConfig {
    /// Read the process environment and the syslog sentinel file.
    ///
    /// **Errors**
    /// - [`FlogError::UnknownSeverity`](crate::error::FlogError::UnknownSeverity)
    ///   if `FLOG_LEVEL` names no severity.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_opt, Path::new(SYSLOG_SENTINEL_PATH).exists())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F, sentinel_exists: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = FlogConfig::default();

        if let Some(level) = lookup(FLOG_LEVEL_ENV) {
            config.default_level = level.parse()?;
        }

        config.origin = lookup(SYSLOG_ORIGIN_ENV);

        if let Some(name) = lookup(SYSLOG_FACILITY_ENV) {
            match Facility::from_name(&name) {
                Some(facility) => config.facility = facility,
                None => tracing::warn!(facility = %name, "unknown syslog facility, using local0"),
            }
        }

        let force_file = lookup(FLOG_NOT_SYSLOG_ENV).is_some();
        config.backend = BackendKind::detect(force_file, lookup(FLOG_ENV).as_deref(), sentinel_exists);

        Ok(config)
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_monitor_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.monitor_root = root.into();
        self
    }

    pub fn with_default_level(mut self, level: Severity) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_facility(mut self, facility: Facility) -> Self {
        self.facility = facility;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }
}
