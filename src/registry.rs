//! Per-stream logger registries.
//!
//! [`LoggerFactory`] owns two independent name → [`Logger`] maps. The
//! primary registry follows the configured backend; the monitor registry
//! always writes files under its own root and is meant for temporary
//! instrumentation. Within a registry each name maps to exactly one
//! logger for the factory's lifetime. Lookup, construction and publish
//! happen under the registry's lock, so racing first calls for the same
//! name build a single sink.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::backend::{make_sink, BackendKind};
use crate::config::FlogConfig;
use crate::enrich::{EnrichContext, RoleResolver};
use crate::error::Result;
use crate::file_sink::{ConsoleSink, FileSink};
use crate::logger::Logger;
use crate::severity::Severity;
use crate::syslog::{SyslogConnector, SyslogTransport};

/// Name that always yields a fresh, unregistered stdout logger.
pub const STDOUT: &str = "stdout";

type Registry = Mutex<HashMap<String, Arc<Logger>>>;

/// Which registry a lookup goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Primary,
    Monitor,
}

pub struct LoggerFactory {
    config: FlogConfig,
    roles: Option<Arc<dyn RoleResolver>>,
    syslog: Option<Arc<dyn SyslogConnector>>,
    loggers: Registry,
    monitors: Registry,
}

impl LoggerFactory {
    pub fn new(config: FlogConfig) -> Self {
        tracing::info!(
            backend = ?config.backend,
            root = %config.root.display(),
            level = %config.default_level,
            "logger factory configured"
        );
        Self {
            config,
            roles: None,
            syslog: None,
            loggers: Mutex::new(HashMap::new()),
            monitors: Mutex::new(HashMap::new()),
        }
    }

    /// Factory configured from the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(FlogConfig::from_env()?))
    }

    /// Resolver used to fill in `role` from `user_id`.
    pub fn with_role_resolver(mut self, roles: Arc<dyn RoleResolver>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Send syslog-backed streams through `transport` instead of `syslog(3)`.
    pub fn with_syslog_transport(mut self, transport: Arc<dyn SyslogTransport>) -> Self {
        self.syslog = Some(Arc::new(transport));
        self
    }

    /// Open a transport per syslog-backed stream through `connector`.
    pub fn with_syslog_connector(mut self, connector: Arc<dyn SyslogConnector>) -> Self {
        self.syslog = Some(connector);
        self
    }

    pub fn config(&self) -> &FlogConfig {
        &self.config
    }

    /// Logger for stream `name` in the primary registry.
    ///
    /// `None` or `"stdout"` returns a new console logger on every call.
    /// `level` only applies when the logger is created; a cached logger
    /// keeps the level it was created with.
    ///
    /// **Errors**
    /// - [`FlogError::InvalidSinkTarget`](crate::error::FlogError::InvalidSinkTarget) /
    ///   [`FlogError::SinkUnavailable`](crate::error::FlogError::SinkUnavailable)
    ///   when the backend cannot be opened. Nothing is cached in that case.
    pub fn get(&self, name: Option<&str>, level: Option<Severity>) -> Result<Arc<Logger>> {
        self.lookup(Namespace::Primary, name, level)
    }

    /// Logger for stream `name` in the monitor registry.
    ///
    /// Always file-backed under `monitor_root`; defaults to `Debug`
    /// regardless of the configured default level.
    pub fn monitor_get(&self, name: Option<&str>, level: Option<Severity>) -> Result<Arc<Logger>> {
        self.lookup(Namespace::Monitor, name, level)
    }

    /// Uncached file logger at an arbitrary path, using the configured rotation.
    pub fn rotating(&self, path: impl AsRef<Path>) -> Result<Logger> {
        let sink = FileSink::open(path.as_ref(), self.config.rotation)?;
        Ok(Logger::new(
            Some(path.as_ref().display().to_string()),
            BackendKind::File,
            Severity::Debug,
            Arc::new(sink),
            self.context(None),
        ))
    }

    /// Number of live loggers in the primary and monitor registries.
    pub fn len(&self) -> (usize, usize) {
        (lock(&self.loggers).len(), lock(&self.monitors).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == (0, 0)
    }

    fn lookup(&self, ns: Namespace, name: Option<&str>, level: Option<Severity>) -> Result<Arc<Logger>> {
        let name = match name {
            None | Some(STDOUT) => return Ok(Arc::new(self.console())),
            Some(name) => name,
        };

        let registry = match ns {
            Namespace::Primary => &self.loggers,
            Namespace::Monitor => &self.monitors,
        };

        let mut loggers = lock(registry);
        if let Some(found) = loggers.get(name) {
            if let Some(requested) = level.filter(|l| *l != found.level()) {
                tracing::warn!(
                    stream = name,
                    requested = %requested,
                    level = %found.level(),
                    "logger already exists, keeping its level"
                );
            }
            return Ok(Arc::clone(found));
        }

        let logger = Arc::new(self.build(ns, name, level)?);
        loggers.insert(name.to_string(), Arc::clone(&logger));
        Ok(logger)
    }

    fn build(&self, ns: Namespace, name: &str, level: Option<Severity>) -> Result<Logger> {
        let (kind, root, level, group): (BackendKind, &PathBuf, Severity, Option<&str>) = match ns {
            Namespace::Primary => (
                self.config.backend,
                &self.config.root,
                level.unwrap_or(self.config.default_level),
                Some(name),
            ),
            Namespace::Monitor => (
                BackendKind::File,
                &self.config.monitor_root,
                level.unwrap_or(Severity::Debug),
                None,
            ),
        };

        let sink = make_sink(kind, name, root, &self.config, self.syslog.as_ref())?;
        tracing::debug!(stream = name, registry = ?ns, backend = ?kind, %level, "created logger");

        Ok(Logger::new(
            Some(name.to_string()),
            kind,
            level,
            sink,
            self.context(group),
        ))
    }

    fn console(&self) -> Logger {
        Logger::new(
            None,
            BackendKind::Console,
            Severity::Debug,
            Arc::new(ConsoleSink),
            self.context(None),
        )
    }

    fn context(&self, group: Option<&str>) -> EnrichContext {
        EnrichContext {
            group: group.map(str::to_string),
            origin: self.config.origin.clone(),
            roles: self.roles.clone(),
        }
    }
}

fn lock(registry: &Registry) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Logger>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlogError;
    use crate::syslog::mock::RecordingTransport;
    use std::fs;

    fn factory(dir: &Path) -> LoggerFactory {
        LoggerFactory::new(
            FlogConfig::default()
                .with_root(dir.join("flog"))
                .with_monitor_root(dir.join("monitor")),
        )
    }

    #[test]
    fn get_returns_same_instance() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory(dir.path());
        let a = factory.get(Some("api"), None).unwrap();
        let b = factory.get(Some("api"), None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.len(), (1, 0));
    }

    #[test]
    fn first_level_wins() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory(dir.path());
        let a = factory.get(Some("core"), Some(Severity::Warn)).unwrap();
        let b = factory.get(Some("core"), Some(Severity::Debug)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.level(), Severity::Warn);
    }

    #[test]
    fn level_defaults_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let factory = LoggerFactory::new(
            FlogConfig::default()
                .with_root(dir.path())
                .with_default_level(Severity::Error),
        );
        assert_eq!(factory.get(Some("api"), None).unwrap().level(), Severity::Error);
    }

    #[test]
    fn stdout_is_never_cached() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory(dir.path());
        let a = factory.get(None, None).unwrap();
        let b = factory.get(Some("stdout"), None).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.backend(), BackendKind::Console);
        assert!(factory.is_empty());
    }

    #[test]
    fn primary_file_logger_layout() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory(dir.path());
        let logger = factory.get(Some("api"), None).unwrap();
        assert_eq!(logger.backend(), BackendKind::File);
        assert_eq!(logger.group(), Some("api"));
        assert!(dir.path().join("flog/api.log").exists());
    }

    #[test]
    fn monitor_registry_is_separate() {
        let dir = tempfile::tempdir().unwrap();
        let factory = LoggerFactory::new(
            FlogConfig::default()
                .with_backend(BackendKind::Syslog)
                .with_default_level(Severity::Error)
                .with_root(dir.path().join("flog"))
                .with_monitor_root(dir.path().join("monitor")),
        );
        let monitor = factory.monitor_get(Some("api"), None).unwrap();
        assert_eq!(monitor.backend(), BackendKind::File);
        assert_eq!(monitor.level(), Severity::Debug);
        assert_eq!(monitor.group(), None);
        assert!(dir.path().join("monitor/api.log").exists());
        assert_eq!(factory.len(), (0, 1));
    }

    #[test]
    fn syslog_backend_uses_transport() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::default());
        let factory = LoggerFactory::new(FlogConfig::default().with_backend(BackendKind::Syslog).with_root(dir.path()))
            .with_syslog_transport(transport.clone());

        let logger = factory.get(Some("api"), None).unwrap();
        assert_eq!(logger.backend(), BackendKind::Syslog);
        logger.warn("slow", crate::enrich::LogOptions::new());

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        // Warn goes out as a notice on local0.
        assert_eq!(sent[0].0, 5 | 128);
        assert!(sent[0].1.starts_with("W, ["));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn failed_construction_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();
        let factory = LoggerFactory::new(FlogConfig::default().with_root(&blocker));

        let err = factory.get(Some("api"), None).unwrap_err();
        assert!(matches!(err, FlogError::SinkUnavailable { .. }));
        assert!(factory.is_empty());
    }

    #[test]
    fn rotating_logger_is_uncached() {
        let dir = tempfile::tempdir().unwrap();
        let factory = factory(dir.path());
        let path = dir.path().join("adhoc/import.log");
        let logger = factory.rotating(&path).unwrap();
        logger.info("started", crate::enrich::LogOptions::new());
        assert!(fs::read_to_string(&path).unwrap().contains("] started: "));
        assert!(factory.is_empty());
    }
}
