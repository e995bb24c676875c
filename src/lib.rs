//! Structured logging facade with per-stream backends.
//!
//! Every log call is enriched into a JSON envelope
//! (`{"origin", "properties", "extra"}`) and written as one line to the
//! stream's backend: a size-rotated file under `log/flog/<stream>.log`
//! or the local syslog daemon.
//!
//! ```no_run
//! use flog::{LogOptions, LoggerFactory};
//!
//! let factory = LoggerFactory::from_env()?;
//! let api = factory.get(Some("api"), None)?;
//! api.info("login", LogOptions::new().attr("user_id", 42));
//! # Ok::<(), flog::FlogError>(())
//! ```

pub mod backend;
pub mod config;
pub mod enrich;
pub mod env;
pub mod error;
pub mod file_sink;
pub mod format;
pub mod logger;
pub mod record;
pub mod registry;
pub mod severity;
pub mod sink;
pub mod syslog;

pub mod init;
pub mod layer;

pub use backend::BackendKind;
pub use config::FlogConfig;
pub use enrich::{Failure, LogOptions, Resource, RoleResolver};
pub use error::{FlogError, Result};
pub use logger::Logger;
pub use record::LogRecord;
pub use registry::LoggerFactory;
pub use severity::Severity;
