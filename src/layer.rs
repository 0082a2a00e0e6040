use crate::event::{ErrorInfo, Level, LogEvent, PropertyValue, Scalar};
use crate::sink::TelemetrySink;
use chrono::Utc;
use std::error::Error;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that observes events and forwards them to a
/// [`TelemetrySink`] via a bounded channel and background task.
///
/// Events below `min_level` are ignored. Everything else is captured into a
/// [`LogEvent`] (fields in declaration order, `message` as the template, a
/// recorded `error` field as the exception) and enqueued without blocking
/// the application thread; delivery happens on a Tokio task that batches
/// messages and backs off on transport failure.
pub struct TelemetryLayer {
    sender: mpsc::Sender<LogEvent>,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

/// Shutdown handle for the background delivery task.
///
/// The host process keeps this guard and calls
/// [`flush_and_close`](Self::flush_and_close) from its own exit path; the
/// crate never registers process-lifecycle hooks of its own. Dropping the
/// guard also stops the worker after a final drain.
pub struct TelemetryGuard {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TelemetryGuard {
    /// Drain queued events, deliver the final batch and close the
    /// transport.
    pub async fn flush_and_close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = self.handle.await;
    }
}

impl TelemetryLayer {
    /// Create a new layer and spawn the background delivery task.
    ///
    /// Minimal thresholds are enforced for `buffer`, `batch_size` and
    /// `flush_interval` to avoid degenerate configurations.
    pub fn new(
        sink: TelemetrySink,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
        min_level: Level,
    ) -> (Self, TelemetryGuard) {
        // Enforce minimal thresholds to avoid degenerate configs.
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = if flush_interval < Duration::from_millis(10) {
            Duration::from_millis(10)
        } else {
            flush_interval
        };

        let (tx, mut rx) = mpsc::channel::<LogEvent>(buffer);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let total_events = Arc::new(AtomicU64::new(0));
        let enqueued_events = Arc::new(AtomicU64::new(0));
        let dropped_events = Arc::new(AtomicU64::new(0));

        let enqueued_events_bg = Arc::clone(&enqueued_events);

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);
            let backoff = Duration::from_millis(100);
            let max_backoff = Duration::from_secs(10);

            loop {
                tokio::select! {
                    maybe = rx.recv() => match maybe {
                        Some(event) => {
                            batch.push(event);
                            enqueued_events_bg.fetch_add(1, Ordering::Relaxed);
                            if batch.len() >= batch_size {
                                if let Err(e) = send_batch(&sink, &mut batch, backoff, max_backoff).await {
                                    eprintln!("error sending telemetry batch: {}", e);
                                }
                            }
                        }
                        None => break,
                    },
                    _ = &mut shutdown_rx => {
                        // Final drain of whatever is already queued.
                        while let Ok(event) = rx.try_recv() {
                            batch.push(event);
                            enqueued_events_bg.fetch_add(1, Ordering::Relaxed);
                        }
                        break;
                    }
                    _ = sleep(flush_interval) => {
                        if !batch.is_empty() {
                            if let Err(e) = send_batch(&sink, &mut batch, backoff, max_backoff).await {
                                eprintln!("error flushing telemetry batch: {}", e);
                            }
                        }
                    }
                }
            }

            if !batch.is_empty() {
                if let Err(e) = send_batch(&sink, &mut batch, backoff, max_backoff).await {
                    eprintln!("error sending final telemetry batch: {}", e);
                }
            }
            if let Err(e) = sink.flush_and_close().await {
                eprintln!("error closing telemetry transport: {}", e);
            }
        });

        (
            Self {
                sender: tx,
                min_level,
                total_events,
                enqueued_events,
                dropped_events,
            },
            TelemetryGuard {
                shutdown: Some(shutdown_tx),
                handle,
            },
        )
    }
}

/// Deliver a batch, retrying with exponential backoff. Retries are capped at
/// `max_backoff`; after that the batch is dropped so shutdown cannot hang on
/// a dead collector.
async fn send_batch(
    sink: &TelemetrySink,
    batch: &mut Vec<LogEvent>,
    mut backoff: Duration,
    max_backoff: Duration,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    loop {
        let mut last_err: Option<Box<dyn Error + Send + Sync>> = None;
        for event in batch.iter() {
            if let Err(e) = sink.emit(event).await {
                last_err = Some(e);
                break;
            }
        }

        match last_err {
            None => {
                batch.clear();
                return Ok(());
            }
            Some(e) if backoff >= max_backoff => {
                batch.clear();
                return Err(e);
            }
            Some(_) => {
                eprintln!("telemetry transport enqueue failed, retrying in {:?}", backoff);
                sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, max_backoff);
            }
        }
    }
}

impl<S> Layer<S> for TelemetryLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let level = Level::from(*event.metadata().level());
        if level < self.min_level {
            return;
        }

        let mut properties = Vec::new();
        let mut message: Option<String> = None;
        let mut error: Option<ErrorInfo> = None;

        let mut visitor = FieldVisitor {
            properties: &mut properties,
            message: &mut message,
            error: &mut error,
        };
        event.record(&mut visitor);

        let record = LogEvent {
            timestamp: Utc::now(),
            level,
            message_template: message.unwrap_or_default(),
            properties,
            error,
        };

        if self.sender.try_send(record).is_err() {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("telemetry channel full, dropping log event");
        }
    }
}

use tracing::field::{Field, Visit};

/// Captures a tracing event's fields in declaration order.
///
/// The `message` field becomes the event's template; a field recorded
/// through `record_error` becomes the exception (with its source chain);
/// everything else lands in `properties`.
struct FieldVisitor<'a> {
    properties: &'a mut Vec<(String, PropertyValue)>,
    message: &'a mut Option<String>,
    error: &'a mut Option<ErrorInfo>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.properties.push((
                field.name().to_string(),
                PropertyValue::Scalar(Scalar::String(value.to_string())),
            ));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.properties
            .push((field.name().to_string(), PropertyValue::Scalar(Scalar::Int(value))));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.properties
            .push((field.name().to_string(), PropertyValue::Scalar(Scalar::UInt(value))));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.properties
            .push((field.name().to_string(), PropertyValue::Scalar(Scalar::Float(value))));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.properties
            .push((field.name().to_string(), PropertyValue::Scalar(Scalar::Bool(value))));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        let info = ErrorInfo::from_error(value);
        if self.error.is_none() {
            *self.error = Some(info);
        } else {
            self.properties.push((
                field.name().to_string(),
                PropertyValue::Scalar(Scalar::String(value.to_string())),
            ));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.properties.push((
                field.name().to_string(),
                PropertyValue::Scalar(Scalar::String(format!("{:?}", value))),
            ));
        }
    }
}
