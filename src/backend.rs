use std::path::Path;
use std::sync::Arc;

use crate::config::FlogConfig;
use crate::error::Result;
use crate::file_sink::{ConsoleSink, FileSink};
use crate::format::Formatter;
use crate::sink::LogSink;
use crate::syslog::{SyslogConnector, SyslogSink};

/// Where a logger's lines end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Rotating `<name>.log` under a registry root.
    File,
    /// Local syslog daemon.
    Syslog,
    /// Process stdout; only for unregistered loggers.
    Console,
}

impl BackendKind {
    /// Backend policy for the primary registry.
    ///
    /// Syslog is used in production and staging, or when the sentinel file
    /// exists, unless file mode is forced.
    pub fn detect(force_file: bool, deploy_env: Option<&str>, sentinel_exists: bool) -> BackendKind {
        if force_file {
            return BackendKind::File;
        }
        let deployed = matches!(
            deploy_env.map(|e| e.trim().to_ascii_lowercase()).as_deref(),
            Some("production") | Some("staging")
        );
        if deployed || sentinel_exists {
            BackendKind::Syslog
        } else {
            BackendKind::File
        }
    }

    /// Formatter bound to loggers using this backend.
    pub fn formatter(self) -> Formatter {
        match self {
            BackendKind::Syslog => Formatter::Syslog,
            BackendKind::File | BackendKind::Console => Formatter::Plain,
        }
    }
}

/// Build the sink for stream `name`.
///
/// File sinks live at `<root>/<name>.log`. A configured syslog connector
/// replaces the process-wide `syslog(3)` connection.
pub fn make_sink(
    kind: BackendKind,
    name: &str,
    root: &Path,
    config: &FlogConfig,
    connector: Option<&Arc<dyn SyslogConnector>>,
) -> Result<Arc<dyn LogSink>> {
    match kind {
        BackendKind::File => {
            let sink = FileSink::open(root.join(format!("{name}.log")), config.rotation)?;
            Ok(Arc::new(sink) as Arc<dyn LogSink>)
        }
        BackendKind::Syslog => {
            let sink = match connector {
                Some(connector) => SyslogSink::with_transport(connector.connect(name)?, config.facility),
                None => SyslogSink::open(name, config.facility)?,
            };
            Ok(Arc::new(sink) as Arc<dyn LogSink>)
        }
        BackendKind::Console => Ok(Arc::new(ConsoleSink) as Arc<dyn LogSink>),
    }
}
