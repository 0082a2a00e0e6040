use crate::event::{ErrorInfo, Level, LogEvent};
use crate::formatter::JsonDataFormatter;
use crate::severity::severity_of;
use crate::transport::{LogMsg, Transport};
use std::error::Error;
use std::sync::Arc;

/// Projects [`LogEvent`]s into [`LogMsg`]s and hands them to a
/// [`Transport`].
///
/// The sink is independent of the transport strategy: anything implementing
/// `enqueue`/`flush_and_close` can sit behind it.
pub struct TelemetrySink {
    formatter: JsonDataFormatter,
    transport: Arc<dyn Transport>,
}

impl TelemetrySink {
    pub fn new(transport: Arc<dyn Transport>) -> TelemetrySink {
        TelemetrySink {
            formatter: JsonDataFormatter::new(),
            transport,
        }
    }

    /// Build the outbound message for a single event.
    ///
    /// Severity and message are carried separately from the data document,
    /// so the document only holds properties and the exception block. Events
    /// at `Error` or `Fatal` that carry no error of their own get one
    /// synthesized from the rendered message, so the backend still records
    /// an error entry for them.
    pub fn to_message(&self, event: &LogEvent) -> LogMsg {
        let rendered = event.render_message();

        let ex = match &event.error {
            Some(error) => Some(error.clone()),
            None if event.level >= Level::Error => {
                Some(ErrorInfo::new("LoggedError", rendered.clone()))
            }
            None => None,
        };

        LogMsg {
            timestamp: event.timestamp,
            level: severity_of(event.level).to_string(),
            msg: rendered,
            data: self.supplementary_data(event),
            ex,
        }
    }

    /// Data-only document for the event, or `None` when it would be `{}`.
    fn supplementary_data(&self, event: &LogEvent) -> Option<String> {
        let mut payload = String::new();
        self.formatter.format_data(event, Some(&mut payload)).ok()?;
        if payload == "{}" {
            None
        } else {
            Some(payload)
        }
    }

    /// Convert and deliver one event through the transport.
    pub async fn emit(&self, event: &LogEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        let msg = self.to_message(event);
        self.transport.enqueue(&msg).await
    }

    /// Flush and close the underlying transport.
    pub async fn flush_and_close(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.transport.flush_and_close().await
    }
}
