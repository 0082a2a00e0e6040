use crate::event::Level;
use crate::layer::{TelemetryGuard, TelemetryLayer};
use crate::sink::TelemetrySink;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the telemetry layer.
///
/// **Fields**
/// - `channel_buffer`: maximum number of queued [`crate::event::LogEvent`]s
///   before new ones are dropped.
/// - `batch_size`: batch size for delivery through the transport.
/// - `flush_interval`: maximum interval between flushes even when the batch
///   is not full.
/// - `min_level`: least severe [`Level`] forwarded to the backend.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top so events also show up on the console.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            min_level: Level::Information,
            enable_stdout: true,
        }
    }
}

/// Initialize the global `tracing` subscriber using the provided transport
/// and [`SinkConfig`].
///
/// **Parameters**
/// - `transport`: implementation of [`Transport`] that will receive
///   serialized messages.
/// - `config`: [`SinkConfig`] controlling buffering, batching and filtering
///   behavior of the layer.
///
/// **Returns**
///
/// A [`TelemetryGuard`] the host must keep alive. Wire its own
/// signal/exit handling to [`TelemetryGuard::flush_and_close`] to drain the
/// queue and close the transport; no exit hook is registered implicitly.
///
/// This installs a [`Registry`] combined with [`TelemetryLayer`] as the
/// global default subscriber, so all `tracing` events in the process are
/// observed by the layer.
pub fn init_tracing_with_config(
    transport: Arc<dyn Transport>,
    config: SinkConfig,
) -> TelemetryGuard {
    let sink = TelemetrySink::new(transport);
    let (layer, guard) = TelemetryLayer::new(
        sink,
        config.channel_buffer,
        config.batch_size,
        config.flush_interval,
        config.min_level,
    );

    // The telemetry layer is always installed. With `enable_stdout = true`
    // a `fmt` layer is stacked on top; the subscriber is assembled in two
    // variants for type compatibility.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }

    guard
}

/// Initialize tracing with sensible defaults.
///
/// **Parameters**
/// - `transport`: implementation of [`Transport`] that will receive
///   serialized messages.
///
/// **Behavior**
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`SinkConfig::default`]. This is the recommended entrypoint for typical
/// services.
pub fn init_tracing(transport: Arc<dyn Transport>) -> TelemetryGuard {
    init_tracing_with_config(transport, SinkConfig::default())
}
