//! Turns a raw log call (tag + options) into a [`LogRecord`].
//!
//! The enrichment steps run in a fixed order:
//!
//! 1. tag override: the positional tag moves to `extra.msg`
//! 2. resource: `resource_type` / `resource_id`
//! 3. `distinct_id` from `user_id`, else `client_ip`
//! 4. `role` through the configured [`RoleResolver`]
//! 5. error: `extra.backtrace` from the first frames of a [`Failure`]
//!
//! Derived fields never overwrite a value the caller supplied. A JSON
//! `null` counts as "not supplied".

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::record::LogRecord;
use crate::severity::Severity;

/// Frames kept from a failure's stack.
pub const BACKTRACE_FRAMES: usize = 10;

/// Looks up a user's role by id.
///
/// `Ok(None)` means "no such user". Errors are absorbed by the enricher and
/// treated the same way, so implementations may freely bubble up whatever
/// their storage layer returns.
pub trait RoleResolver: Send + Sync {
    fn resolve_role(&self, user_id: &Value) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;
}

impl<F> RoleResolver for F
where
    F: Fn(&Value) -> Option<String> + Send + Sync,
{
    fn resolve_role(&self, user_id: &Value) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        Ok(self(user_id))
    }
}

/// A domain object a log call is about.
pub trait Resource {
    /// Defaults to the short type name, e.g. `Order` for `shop::model::Order<u64>`.
    fn resource_type(&self) -> String
    where
        Self: Sized,
    {
        short_type_name::<Self>().to_string()
    }

    fn resource_id(&self) -> Value;
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// An error value attached to a log call, reduced to its stack frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Failure {
    frames: Vec<String>,
}

impl Failure {
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Failure {
            frames: frames.into_iter().map(Into::into).collect(),
        }
    }

    /// Capture the current call stack, starting at the caller.
    pub fn capture() -> Self {
        let frames = parse_frames(&Backtrace::force_capture().to_string());
        Failure {
            frames: after_capture(frames),
        }
    }

    /// Frames are the symbol lines of the rendered backtrace, file locations dropped.
    pub fn from_backtrace(backtrace: &Backtrace) -> Self {
        Self::new(parse_frames(&backtrace.to_string()))
    }

    /// Walk an error's `source()` chain, outermost first.
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        let mut frames = Vec::new();
        let mut current = Some(err);
        while let Some(e) = current {
            frames.push(e.to_string());
            current = e.source();
        }
        Failure { frames }
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// The first [`BACKTRACE_FRAMES`] frames joined by `"; "`.
    pub fn backtrace(&self) -> String {
        self.frames
            .iter()
            .take(BACKTRACE_FRAMES)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Drop the unwinder frames and `capture` itself.
fn after_capture(mut frames: Vec<String>) -> Vec<String> {
    match frames.iter().position(|f| f.contains("Failure::capture")) {
        Some(i) => frames.split_off(i + 1),
        None => frames,
    }
}

fn parse_frames(rendered: &str) -> Vec<String> {
    rendered
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let (index, rest) = line.split_once(": ")?;
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some(rest.trim().to_string())
        })
        .collect()
}

/// Options for a single log call.
///
/// Unrecognized keys are caller attributes and end up verbatim in the
/// record's `properties`.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    tag: Option<String>,
    attributes: Map<String, Value>,
    extra: Map<String, Value>,
    resource: Option<(String, Value)>,
    error: Option<Failure>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a loose key/value map: `tag` and `extra` are recognized,
    /// everything else becomes an attribute.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut options = LogOptions::default();
        for (key, value) in map {
            match (key.as_str(), value) {
                ("tag", Value::String(tag)) => options.tag = Some(tag),
                ("tag", Value::Null) => {}
                ("tag", other) => options.tag = Some(other.to_string()),
                ("extra", Value::Object(extra)) => options.extra.extend(extra),
                (_, value) => {
                    options.attributes.insert(key, value);
                }
            }
        }
        options
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn resource<R: Resource>(mut self, resource: &R) -> Self {
        self.resource = Some((resource.resource_type(), resource.resource_id()));
        self
    }

    pub fn error(mut self, failure: impl Into<Failure>) -> Self {
        self.error = Some(failure.into());
        self
    }
}

impl From<Map<String, Value>> for LogOptions {
    fn from(map: Map<String, Value>) -> Self {
        LogOptions::from_map(map)
    }
}

impl From<Backtrace> for Failure {
    fn from(backtrace: Backtrace) -> Self {
        Failure::from_backtrace(&backtrace)
    }
}

/// Per-logger inputs to enrichment.
#[derive(Clone, Default)]
pub struct EnrichContext {
    /// Stream name; prefixes tags and is the fallback origin.
    pub group: Option<String>,
    /// Process-wide origin override.
    pub origin: Option<String>,
    pub roles: Option<Arc<dyn RoleResolver>>,
}

impl fmt::Debug for EnrichContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichContext")
            .field("group", &self.group)
            .field("origin", &self.origin)
            .field("roles", &self.roles.is_some())
            .finish()
    }
}

fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn default_field(map: &mut Map<String, Value>, key: &str, value: Value) {
    if present(map, key).is_none() && !value.is_null() {
        map.insert(key.to_string(), value);
    }
}

fn lookup_role(roles: &dyn RoleResolver, user_id: &Value) -> Option<String> {
    match roles.resolve_role(user_id) {
        Ok(role) => role,
        Err(e) => {
            tracing::debug!(%user_id, error = %e, "role lookup failed");
            None
        }
    }
}

/// Build the record for one log call. `options` is consumed; nothing the
/// caller still holds is touched.
pub fn build(ctx: &EnrichContext, severity: Severity, tag: &str, options: LogOptions) -> LogRecord {
    let LogOptions {
        tag: tag_override,
        mut attributes,
        mut extra,
        resource,
        error,
    } = options;

    let mut tag = tag.to_string();
    if let Some(alt) = tag_override {
        default_field(&mut extra, "msg", Value::String(tag));
        tag = alt;
    }

    if let Some((resource_type, resource_id)) = resource {
        default_field(&mut attributes, "resource_type", Value::String(resource_type));
        default_field(&mut attributes, "resource_id", resource_id);
    }

    if present(&attributes, "distinct_id").is_none() {
        let distinct = present(&attributes, "user_id")
            .or_else(|| present(&attributes, "client_ip"))
            .cloned();
        if let Some(distinct) = distinct {
            attributes.insert("distinct_id".into(), distinct);
        }
    }

    if present(&attributes, "role").is_none() {
        let role = match (&ctx.roles, present(&attributes, "user_id")) {
            (Some(roles), Some(user_id)) => lookup_role(roles.as_ref(), user_id),
            _ => None,
        };
        if let Some(role) = role {
            attributes.insert("role".into(), Value::String(role));
        }
    }

    if let Some(failure) = error {
        extra.remove("error");
        extra.insert("backtrace".into(), Value::String(failure.backtrace()));
    }

    let tag = match &ctx.group {
        Some(group) => format!("{group}_{tag}"),
        None => tag,
    };

    LogRecord {
        origin: ctx.origin.clone().or_else(|| ctx.group.clone()),
        attributes,
        extra,
        tag,
        severity,
    }
}
