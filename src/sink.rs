use std::error::Error;

use crate::severity::Severity;

/// Destination for formatted log lines.
///
/// Implementations wrap a concrete backend (rotating file, syslog, stdout).
/// A single sink instance is shared by every caller of its logger, so
/// `send` must be safe to call concurrently; each call writes one whole
/// line or fails without writing a partial one.
pub trait LogSink: Send + Sync {
    /// Write a single formatted line.
    ///
    /// **Parameters**
    /// - `severity`: severity of the record, for backends that tag lines
    ///   with a priority of their own.
    /// - `line`: fully formatted line including the trailing newline.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the line.
    /// - `Err(..)` on a backend failure. The logger reports it and drops
    ///   the line; it is never retried.
    fn send(&self, severity: Severity, line: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered lines. Default implementation is a no-op.
    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
