use std::sync::Arc;

use flog::init::{init_tracing_with_config, LayerConfig};
use flog::LoggerFactory;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let factory = Arc::new(LoggerFactory::from_env()?);
    init_tracing_with_config(factory, LayerConfig { enable_stdout: true })?;

    // The target names the stream: these land in log/flog/auth.log.
    info!(target: "auth", user_id = 42, "login");
    error!(target: "auth", user_id = 42, reason = "invalid password", "login_failed");
    Ok(())
}
