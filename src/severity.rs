use std::fmt;
use std::str::FromStr;

use crate::error::FlogError;

/// Labels indexed by severity ordinal. Anything past the end renders as `ANY`.
pub const SEV_LABEL: [&str; 6] = ["DEBUG", "INFO", "WARN", "ERROR", "FATAL", "ANY"];

/// Ordered log severity. A logger emits records at or above its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
    /// Sentinel level, rendered as `ANY`. Always passes the threshold.
    Unknown = 5,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
        Severity::Unknown,
    ];

    pub fn from_index(index: usize) -> Option<Severity> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        label_for(self.index())
    }

    /// First character of the label, as it appears at the start of a line.
    pub fn initial(self) -> char {
        self.label().chars().next().unwrap_or('A')
    }
}

/// Label lookup by raw ordinal, falling back to `ANY` when out of range.
pub fn label_for(index: usize) -> &'static str {
    SEV_LABEL.get(index).copied().unwrap_or("ANY")
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = FlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Severity::Debug),
            "INFO" => Ok(Severity::Info),
            "WARN" => Ok(Severity::Warn),
            "ERROR" => Ok(Severity::Error),
            "FATAL" => Ok(Severity::Fatal),
            "UNKNOWN" | "ANY" => Ok(Severity::Unknown),
            _ => Err(FlogError::UnknownSeverity(s.to_string())),
        }
    }
}
