use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};

use crate::error::{FlogError, Result};
use crate::severity::Severity;
use crate::sink::LogSink;

/// Rotation settings handed to the rotating writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Number of rotated files kept next to the live one.
    pub keep: usize,
    /// Rotate once the live file grows past this many bytes.
    pub max_bytes: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            keep: 3,
            max_bytes: 10_240_000,
        }
    }
}

/// Append-only file sink with size-based rotation.
///
/// The live file is `path`; rotated siblings are `path.1` (newest) up to
/// `path.<keep>`. Lines are written under a mutex and flushed right away.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<FileRotate<AppendCount>>,
}

impl FileSink {
    /// Open (or create) the log file, creating missing parent directories.
    ///
    /// **Errors**
    /// - [`FlogError::InvalidSinkTarget`] if `path` cannot name a log file.
    /// - [`FlogError::SinkUnavailable`] if the directory or file cannot be
    ///   created or opened.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> Result<Self> {
        let path = path.into();
        validate_target(&path, &policy)?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| unavailable(dir, source))?;
        }
        // Probe the file so an unwritable target fails here rather than on first write.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| unavailable(&path, source))?;

        let writer = FileRotate::new(
            &path,
            AppendCount::new(policy.keep),
            ContentLimit::BytesSurpassed(policy.max_bytes),
            Compression::None,
            #[cfg(unix)]
            None,
        );

        tracing::debug!(path = %path.display(), keep = policy.keep, max_bytes = policy.max_bytes, "opened file sink");

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn validate_target(path: &Path, policy: &RotationPolicy) -> Result<()> {
    let target = || path.display().to_string();
    if path.as_os_str().is_empty() {
        return Err(FlogError::InvalidSinkTarget { target: target(), reason: "empty path" });
    }
    if path.file_name().is_none() || path.is_dir() {
        return Err(FlogError::InvalidSinkTarget { target: target(), reason: "not a file path" });
    }
    if policy.max_bytes == 0 {
        return Err(FlogError::InvalidSinkTarget { target: target(), reason: "rotation size must be positive" });
    }
    Ok(())
}

fn unavailable(path: &Path, source: io::Error) -> FlogError {
    FlogError::SinkUnavailable {
        target: path.display().to_string(),
        source,
    }
}

impl LogSink for FileSink {
    fn send(&self, _severity: Severity, line: &str) -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner).flush()?;
        Ok(())
    }
}

/// Writes lines to the process's stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn send(&self, _severity: Severity, line: &str) -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
        io::stdout().lock().flush()?;
        Ok(())
    }
}
