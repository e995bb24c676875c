use std::fmt;
use std::sync::Arc;

use crate::backend::BackendKind;
use crate::enrich::{self, EnrichContext, LogOptions};
use crate::format::Formatter;
use crate::severity::Severity;
use crate::sink::LogSink;

/// A configured logger for one stream.
///
/// Backend, formatter and threshold are fixed at construction. Loggers are
/// `Send + Sync` and meant to be shared behind an `Arc`.
pub struct Logger {
    name: Option<String>,
    backend: BackendKind,
    level: Severity,
    formatter: Formatter,
    sink: Arc<dyn LogSink>,
    context: EnrichContext,
}

impl Logger {
    pub fn new(
        name: Option<String>,
        backend: BackendKind,
        level: Severity,
        sink: Arc<dyn LogSink>,
        context: EnrichContext,
    ) -> Self {
        Self {
            name,
            backend,
            level,
            formatter: backend.formatter(),
            sink,
            context,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Stream group prefixed to tags; only set on primary-registry loggers.
    pub fn group(&self) -> Option<&str> {
        self.context.group.as_deref()
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn formatter(&self) -> Formatter {
        self.formatter
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level
    }

    pub fn debug(&self, tag: &str, options: impl Into<LogOptions>) {
        self.log(Severity::Debug, tag, options);
    }

    pub fn info(&self, tag: &str, options: impl Into<LogOptions>) {
        self.log(Severity::Info, tag, options);
    }

    pub fn warn(&self, tag: &str, options: impl Into<LogOptions>) {
        self.log(Severity::Warn, tag, options);
    }

    pub fn error(&self, tag: &str, options: impl Into<LogOptions>) {
        self.log(Severity::Error, tag, options);
    }

    pub fn fatal(&self, tag: &str, options: impl Into<LogOptions>) {
        self.log(Severity::Fatal, tag, options);
    }

    pub fn unknown(&self, tag: &str, options: impl Into<LogOptions>) {
        self.log(Severity::Unknown, tag, options);
    }

    /// Enrich and emit one record at a severity chosen at runtime.
    ///
    /// Suppressed severities return before enrichment, so neither the role
    /// lookup nor JSON serialization runs for them.
    pub fn log(&self, severity: Severity, tag: &str, options: impl Into<LogOptions>) {
        if !self.enabled(severity) {
            return;
        }
        let record = enrich::build(&self.context, severity, tag, options.into());
        self.add(severity, Some(&record.tag), || record.to_json());
    }

    /// Format and write the message produced by `message`.
    ///
    /// `message` is only called when `severity` passes the threshold.
    /// Returns whether the line was accepted by the sink; write failures
    /// are reported through `tracing` and otherwise dropped.
    pub fn add<F>(&self, severity: Severity, progname: Option<&str>, message: F) -> bool
    where
        F: FnOnce() -> String,
    {
        if !self.enabled(severity) {
            return false;
        }
        let progname = progname.or(self.group()).unwrap_or_default();
        let line = self.formatter.format(severity, None, progname, &message());
        match self.sink.send(severity, &line) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    stream = self.name().unwrap_or("stdout"),
                    backend = ?self.backend,
                    error = %e,
                    "dropping log line"
                );
                false
            }
        }
    }

    pub fn flush(&self) {
        if let Err(e) = self.sink.flush() {
            tracing::warn!(stream = self.name().unwrap_or("stdout"), error = %e, "flush failed");
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .field("level", &self.level)
            .field("formatter", &self.formatter)
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::error::Error;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        lines: Mutex<Vec<(Severity, String)>>,
    }

    impl LogSink for Capture {
        fn send(&self, severity: Severity, line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.lines.lock().unwrap().push((severity, line.to_string()));
            Ok(())
        }
    }

    struct Broken;

    impl LogSink for Broken {
        fn send(&self, _: Severity, _: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("socket closed".into())
        }
    }

    fn logger(level: Severity, sink: Arc<dyn LogSink>) -> Logger {
        let context = EnrichContext {
            group: Some("api".into()),
            ..Default::default()
        };
        Logger::new(Some("api".into()), BackendKind::File, level, sink, context)
    }

    #[test]
    fn below_threshold_never_calls_producer() {
        let sink = Arc::new(Capture::default());
        let logger = logger(Severity::Warn, sink.clone());
        let called = Cell::new(false);

        let written = logger.add(Severity::Info, None, || {
            called.set(true);
            "never".to_string()
        });

        assert!(!written);
        assert!(!called.get());
        assert!(sink.lines.lock().unwrap().is_empty());
    }

    #[test]
    fn suppressed_log_call_writes_nothing() {
        let sink = Arc::new(Capture::default());
        let logger = logger(Severity::Warn, sink.clone());
        logger.info("login", LogOptions::new().attr("user_id", 1));
        logger.debug("noise", LogOptions::new());
        assert!(sink.lines.lock().unwrap().is_empty());
    }

    #[test]
    fn writes_prefixed_tag_and_envelope() {
        let sink = Arc::new(Capture::default());
        let logger = logger(Severity::Debug, sink.clone());
        logger.error("login", LogOptions::new().attr("user_id", 42));

        let lines = sink.lines.lock().unwrap();
        let (severity, line) = &lines[0];
        assert_eq!(*severity, Severity::Error);
        assert!(line.starts_with("E, ["), "{line}");
        assert!(
            line.ends_with(
                "] api_login: {\"origin\":\"api\",\"properties\":{\"user_id\":42,\"distinct_id\":42},\"extra\":{}}\n"
            ),
            "{line}"
        );
    }

    #[test]
    fn per_severity_calls_use_their_level() {
        let sink = Arc::new(Capture::default());
        let logger = logger(Severity::Debug, sink.clone());
        logger.debug("t", LogOptions::new());
        logger.info("t", LogOptions::new());
        logger.warn("t", LogOptions::new());
        logger.error("t", LogOptions::new());
        logger.fatal("t", LogOptions::new());
        logger.unknown("t", LogOptions::new());

        let seen: Vec<Severity> = sink.lines.lock().unwrap().iter().map(|(s, _)| *s).collect();
        assert_eq!(seen, Severity::ALL);
    }

    #[test]
    fn progname_defaults_to_group() {
        let sink = Arc::new(Capture::default());
        let logger = logger(Severity::Debug, sink.clone());
        assert!(logger.add(Severity::Info, None, || "raw".into()));
        assert!(sink.lines.lock().unwrap()[0].1.ends_with("] api: raw\n"));
    }

    #[test]
    fn sink_failure_is_swallowed() {
        let logger = logger(Severity::Debug, Arc::new(Broken));
        logger.fatal("crash", LogOptions::new());
        assert!(!logger.add(Severity::Fatal, None, || "x".into()));
    }

    #[test]
    fn sequential_calls_keep_order() {
        let sink = Arc::new(Capture::default());
        let logger = logger(Severity::Debug, sink.clone());
        for i in 0..20 {
            logger.info(&format!("step{i}"), LogOptions::new());
        }
        let lines = sink.lines.lock().unwrap();
        for (i, (_, line)) in lines.iter().enumerate() {
            assert!(line.contains(&format!("api_step{i}:")), "{line}");
        }
    }
}
