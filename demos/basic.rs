use std::sync::Arc;

use flog::env::env_or;
use flog::{Failure, LogOptions, LoggerFactory, Resource};
use serde_json::{json, Value};

struct Order {
    id: u64,
}

impl Resource for Order {
    fn resource_id(&self) -> Value {
        json!(self.id)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Backend, level and origin come from FLOG_* / SYSLOG_* variables.
    let factory = LoggerFactory::from_env()?.with_role_resolver(Arc::new(|user_id: &Value| {
        (user_id.as_u64() == Some(1)).then(|| "admin".to_string())
    }));

    let stream = env_or("DEMO_STREAM", "api");
    let api = factory.get(Some(stream.as_str()), None)?;

    api.info("login", LogOptions::new().attr("user_id", 1).attr("client_ip", "10.0.0.8"));
    api.warn("slow_checkout", LogOptions::new().resource(&Order { id: 77 }).attr("ms", 2300));
    api.error(
        "card declined for order 77",
        LogOptions::new().tag("payment_failed").error(Failure::capture()),
    );

    // Console loggers are never cached.
    factory.get(None, None)?.info("done", LogOptions::new().attr("stream", stream));
    Ok(())
}
