use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::enrich::LogOptions;
use crate::registry::LoggerFactory;
use crate::severity::Severity;

/// `tracing_subscriber` layer that routes events into flog streams.
///
/// The event target picks the stream, the `message` field becomes the
/// tag and every other field an attribute:
///
/// ```ignore
/// tracing::info!(target: "api", user_id = 42, "login");
/// // same as factory.get(Some("api"), None)?.info("login", attrs)
/// ```
///
/// Module paths become dotted stream names, so an event from
/// `hyper::proto::h1` lands in stream `hyper.proto.h1`. Every distinct
/// target gets its own primary stream; filter dependency targets in front
/// of this layer to keep them out. Events emitted by this crate itself are
/// skipped.
pub struct FlogLayer {
    factory: Arc<LoggerFactory>,
}

impl FlogLayer {
    pub fn new(factory: Arc<LoggerFactory>) -> Self {
        Self { factory }
    }
}

/// Map a `tracing` level onto the fixed severity set. `TRACE` folds into `Debug`.
pub fn severity_of(level: &Level) -> Severity {
    if *level == Level::ERROR {
        Severity::Error
    } else if *level == Level::WARN {
        Severity::Warn
    } else if *level == Level::INFO {
        Severity::Info
    } else {
        Severity::Debug
    }
}

/// Stream name for a `tracing` target.
pub fn stream_for(target: &str) -> String {
    target.replace("::", ".")
}

fn is_internal(target: &str) -> bool {
    let own = env!("CARGO_CRATE_NAME");
    target == own || target.strip_prefix(own).is_some_and(|rest| rest.starts_with("::"))
}

impl<S> Layer<S> for FlogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_internal(meta.target()) {
            return;
        }

        let stream = stream_for(meta.target());
        let logger = match self.factory.get(Some(stream.as_str()), None) {
            Ok(logger) => logger,
            Err(e) => {
                // tracing is not usable from inside the subscriber.
                eprintln!("flog: no logger for target {}: {}", meta.target(), e);
                return;
            }
        };
        let severity = severity_of(meta.level());
        if !logger.enabled(severity) {
            return;
        }

        let mut fields = Map::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let tag = message.unwrap_or_else(|| meta.name().to_string());
        logger.log(severity, &tag, LogOptions::from_map(fields));
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Map<String, Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}
