use std::sync::Arc;

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::layer::FlogLayer;
use crate::registry::LoggerFactory;

/// Options for [`init_tracing_with_config`].
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is
///   stacked on top of [`FlogLayer`] so events are also printed to the
///   console. This includes flog's own diagnostics.
#[derive(Clone, Debug, Default)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

/// Install a global `tracing` subscriber that feeds `factory`.
///
/// **Effects**
///
/// Sets a [`Registry`] combined with [`FlogLayer`] as the global default
/// subscriber, so every `tracing` event in the process is routed to the
/// stream named by its target.
///
/// **Errors**
///
/// Fails if a global subscriber was already installed.
pub fn init_tracing_with_config(
    factory: Arc<LoggerFactory>,
    config: LayerConfig,
) -> Result<(), SetGlobalDefaultError> {
    let layer = FlogLayer::new(factory);

    // The two stacks have different types, so each branch installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(factory: Arc<LoggerFactory>) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(factory, LayerConfig::default())
}
