use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use tracing_telemetry_sink::event::Level;
use tracing_telemetry_sink::layer::{TelemetryGuard, TelemetryLayer};
use tracing_telemetry_sink::sink::TelemetrySink;
use tracing_telemetry_sink::transport::{LogMsg, Transport};

/// Transport that records every message instead of delivering it.
#[derive(Clone, Default)]
struct CaptureTransport {
    messages: Arc<Mutex<Vec<LogMsg>>>,
    closed: Arc<AtomicBool>,
}

impl CaptureTransport {
    fn messages(&self) -> Vec<LogMsg> {
        self.messages.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Transport for CaptureTransport {
    async fn enqueue(&self, msg: &LogMsg) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.messages.lock().expect("lock").push(msg.clone());
        Ok(())
    }

    async fn flush_and_close(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn capture_layer(min_level: Level) -> (CaptureTransport, TelemetryLayer, TelemetryGuard) {
    let transport = CaptureTransport::default();
    let sink = TelemetrySink::new(Arc::new(transport.clone()));
    let (layer, guard) =
        TelemetryLayer::new(sink, 64, 1, Duration::from_millis(20), min_level);
    (transport, layer, guard)
}

#[tokio::test]
async fn events_flow_through_the_layer_to_the_transport() {
    let (transport, layer, guard) = capture_layer(Level::Information);
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        error!(iteration = 5u64, name = "Emergency Broadcast", "broadcast system test failed");
    });

    guard.flush_and_close().await;

    let messages = transport.messages();
    assert_eq!(messages.len(), 1);
    let msg = &messages[0];
    assert_eq!(msg.level, "ERROR");
    assert_eq!(msg.msg, "broadcast system test failed");

    let data = msg.data.as_deref().expect("supplementary data");
    assert!(data.contains("\"iteration\":5"));
    assert!(data.contains("\"name\":\"Emergency Broadcast\""));

    // Error-level event without an attached error gets one synthesized.
    let ex = msg.ex.as_ref().expect("synthesized error");
    assert_eq!(ex.type_name, "LoggedError");
}

#[tokio::test]
async fn events_below_the_minimum_level_are_not_forwarded() {
    let (transport, layer, guard) = capture_layer(Level::Error);
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        info!("not forwarded");
        error!("forwarded");
    });

    guard.flush_and_close().await;

    let messages = transport.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].msg, "forwarded");
}

#[tokio::test]
async fn shutdown_drains_the_queue_and_closes_the_transport() {
    let transport = CaptureTransport::default();
    let sink = TelemetrySink::new(Arc::new(transport.clone()));
    // Batch and flush interval large enough that nothing is delivered
    // before the final drain.
    let (layer, guard) = TelemetryLayer::new(sink, 64, 64, Duration::from_secs(60), Level::Information);
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        for i in 0..10u64 {
            error!(iteration = i, "queued before shutdown");
        }
    });

    guard.flush_and_close().await;

    assert_eq!(transport.messages().len(), 10);
    assert!(transport.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn recorded_error_fields_become_the_exception() {
    #[derive(Debug, thiserror::Error)]
    #[error("Test error")]
    struct ApplicationException;

    let (transport, layer, guard) = capture_layer(Level::Information);
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        let failure = ApplicationException;
        error!(error = &failure as &(dyn std::error::Error + 'static), "request failed");
    });

    guard.flush_and_close().await;

    let messages = transport.messages();
    assert_eq!(messages.len(), 1);
    let ex = messages[0].ex.as_ref().expect("captured error");
    assert_eq!(ex.type_name, "ApplicationException");
    assert_eq!(ex.message, "Test error");
    assert!(messages[0]
        .data
        .as_deref()
        .expect("data")
        .contains("\"Exception\":{\"Type\":\"ApplicationException\""));
}
