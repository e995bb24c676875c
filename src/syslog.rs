//! Syslog forwarding.
//!
//! Lines go to the local syslog daemon through the POSIX `syslog(3)` API.
//! POSIX allows a single open connection per process, so the first
//! [`PosixSyslog`] opened fixes the ident for the whole process; every
//! stream still passes its own facility with each message, and its name
//! is part of the formatted line.
//!
//! Forwarding is best-effort. `syslog(3)` reports nothing back, and a
//! transport that can fail has its errors swallowed by the logger.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::severity::Severity;
use crate::sink::LogSink;

// RFC 5424 severity codes.
pub const LOG_ALERT: i32 = 1;
pub const LOG_ERR: i32 = 3;
pub const LOG_WARNING: i32 = 4;
pub const LOG_NOTICE: i32 = 5;
pub const LOG_INFO: i32 = 6;
pub const LOG_DEBUG: i32 = 7;

/// Syslog priority for a severity, before the facility is mixed in.
///
/// Everything above `Info` lands one step below its namesake: `Warn` is a
/// notice, `Error` a warning and `Fatal` an error. `Unknown` is an alert.
pub fn syslog_severity(severity: Severity) -> i32 {
    match severity {
        Severity::Debug => LOG_DEBUG,
        Severity::Info => LOG_INFO,
        Severity::Warn => LOG_NOTICE,
        Severity::Error => LOG_WARNING,
        Severity::Fatal => LOG_ERR,
        Severity::Unknown => LOG_ALERT,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facility {
    Kern,
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    AuthPriv,
    Ftp,
    #[default]
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    /// Facility bits as expected in a syslog priority.
    pub fn code(self) -> i32 {
        let number = match self {
            Facility::Kern => 0,
            Facility::User => 1,
            Facility::Mail => 2,
            Facility::Daemon => 3,
            Facility::Auth => 4,
            Facility::Syslog => 5,
            Facility::Lpr => 6,
            Facility::News => 7,
            Facility::Uucp => 8,
            Facility::Cron => 9,
            Facility::AuthPriv => 10,
            Facility::Ftp => 11,
            Facility::Local0 => 16,
            Facility::Local1 => 17,
            Facility::Local2 => 18,
            Facility::Local3 => 19,
            Facility::Local4 => 20,
            Facility::Local5 => 21,
            Facility::Local6 => 22,
            Facility::Local7 => 23,
        };
        number << 3
    }

    /// Parse a facility name such as `local3`, `DAEMON` or `LOG_LOCAL3`.
    pub fn from_name(name: &str) -> Option<Facility> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("LOG_").unwrap_or(&upper);
        let facility = match bare {
            "KERN" => Facility::Kern,
            "USER" => Facility::User,
            "MAIL" => Facility::Mail,
            "DAEMON" => Facility::Daemon,
            "AUTH" => Facility::Auth,
            "SYSLOG" => Facility::Syslog,
            "LPR" => Facility::Lpr,
            "NEWS" => Facility::News,
            "UUCP" => Facility::Uucp,
            "CRON" => Facility::Cron,
            "AUTHPRIV" => Facility::AuthPriv,
            "FTP" => Facility::Ftp,
            "LOCAL0" => Facility::Local0,
            "LOCAL1" => Facility::Local1,
            "LOCAL2" => Facility::Local2,
            "LOCAL3" => Facility::Local3,
            "LOCAL4" => Facility::Local4,
            "LOCAL5" => Facility::Local5,
            "LOCAL6" => Facility::Local6,
            "LOCAL7" => Facility::Local7,
            _ => return None,
        };
        Some(facility)
    }
}

/// Channel that hands a prioritized message to a syslog daemon.
pub trait SyslogTransport: Send + Sync {
    fn send(&self, priority: i32, message: &str) -> std::result::Result<(), Box<dyn Error + Send + Sync>>;
}

/// Opens the transport for a newly created syslog stream.
///
/// The registry calls `connect` once per stream, when the stream's logger
/// is first built.
pub trait SyslogConnector: Send + Sync {
    fn connect(&self, ident: &str) -> Result<Arc<dyn SyslogTransport>>;
}

/// A ready transport shared by every stream.
impl SyslogConnector for Arc<dyn SyslogTransport> {
    fn connect(&self, _ident: &str) -> Result<Arc<dyn SyslogTransport>> {
        Ok(Arc::clone(self))
    }
}

/// Sink that forwards formatted lines to syslog under one facility.
pub struct SyslogSink {
    transport: Arc<dyn SyslogTransport>,
    facility: Facility,
}

impl SyslogSink {
    pub fn with_transport(transport: Arc<dyn SyslogTransport>, facility: Facility) -> Self {
        Self { transport, facility }
    }

    /// Connect to the local daemon through `syslog(3)`.
    #[cfg(all(unix, feature = "syslog"))]
    pub fn open(ident: &str, facility: Facility) -> Result<Self> {
        Ok(Self::with_transport(Arc::new(PosixSyslog::open(ident)), facility))
    }

    #[cfg(not(all(unix, feature = "syslog")))]
    pub fn open(ident: &str, _facility: Facility) -> Result<Self> {
        Err(crate::error::FlogError::SinkUnavailable {
            target: format!("syslog:{ident}"),
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "syslog support is not compiled in",
            ),
        })
    }

    pub fn facility(&self) -> Facility {
        self.facility
    }
}

impl fmt::Debug for SyslogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyslogSink").field("facility", &self.facility).finish()
    }
}

impl LogSink for SyslogSink {
    fn send(&self, severity: Severity, line: &str) -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
        let priority = syslog_severity(severity) | self.facility.code();
        self.transport.send(priority, line)
    }
}

#[cfg(all(unix, feature = "syslog"))]
pub use posix::PosixSyslog;

#[cfg(all(unix, feature = "syslog"))]
mod posix {
    use std::error::Error;
    use std::ffi::CString;

    use once_cell::sync::OnceCell;

    use super::SyslogTransport;

    // openlog(3) keeps the ident pointer, so it has to live for the process.
    static IDENT: OnceCell<CString> = OnceCell::new();

    /// `syslog(3)` transport. Cheap to create; `openlog` runs once per process.
    #[derive(Debug, Clone, Copy)]
    pub struct PosixSyslog;

    impl PosixSyslog {
        pub fn open(ident: &str) -> Self {
            IDENT.get_or_init(|| {
                let ident = CString::new(ident.replace('\0', "")).unwrap_or_default();
                unsafe { libc::openlog(ident.as_ptr(), libc::LOG_PID | libc::LOG_NDELAY, 0) };
                ident
            });
            PosixSyslog
        }
    }

    impl SyslogTransport for PosixSyslog {
        fn send(&self, priority: i32, message: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            let message = CString::new(message.replace('\0', " "))?;
            // Fixed "%s" template: the message is never read as a format string.
            unsafe {
                libc::syslog(priority, b"%s\0".as_ptr().cast(), message.as_ptr());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::error::Error;
    use std::sync::Mutex;

    use super::SyslogTransport;

    /// Records every message instead of talking to a daemon.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<(i32, String)>>,
        pub fail: bool,
    }

    impl SyslogTransport for RecordingTransport {
        fn send(&self, priority: i32, message: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
            if self.fail {
                return Err("syslog socket closed".into());
            }
            self.sent.lock().unwrap().push((priority, message.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingTransport;
    use super::*;

    #[test]
    fn priority_combines_severity_and_facility() {
        let transport = Arc::new(RecordingTransport::default());
        let sink = SyslogSink::with_transport(transport.clone(), Facility::Local3);
        sink.send(Severity::Error, "E, [..] api: boom\n").unwrap();
        sink.send(Severity::Fatal, "F, [..] api: down\n").unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0], ((19 << 3) | LOG_WARNING, "E, [..] api: boom\n".to_string()));
        assert_eq!(sent[1].0, (19 << 3) | LOG_ERR);
    }

    #[test]
    fn severity_map() {
        let codes: Vec<i32> = Severity::ALL.iter().map(|s| syslog_severity(*s)).collect();
        assert_eq!(codes, [7, 6, 5, 4, 3, 1]);
    }

    #[test]
    fn facility_names_parse() {
        assert_eq!(Facility::from_name("local0"), Some(Facility::Local0));
        assert_eq!(Facility::from_name("LOG_DAEMON"), Some(Facility::Daemon));
        assert_eq!(Facility::from_name("Local7").map(Facility::code), Some(184));
        assert_eq!(Facility::from_name("local9"), None);
        assert_eq!(Facility::default().code(), 128);
    }

    #[test]
    fn transport_errors_are_returned_to_logger() {
        let transport = Arc::new(RecordingTransport { fail: true, ..Default::default() });
        let sink = SyslogSink::with_transport(transport, Facility::User);
        assert!(sink.send(Severity::Info, "line\n").is_err());
    }
}
