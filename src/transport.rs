use crate::event::ErrorInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;

/// Outbound message handed to a [`Transport`] for delivery.
///
/// This is the full payload the collector needs per event: the canonical
/// severity string, the rendered message text, the optional supplementary
/// data document (the formatter's data-only mode; `None` when the document
/// would be empty) and the optional raw error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogMsg {
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Canonical severity string, e.g. `"ERROR"`.
    #[serde(rename = "Level")]
    pub level: String,
    /// Rendered message text.
    #[serde(rename = "Msg")]
    pub msg: String,
    /// Data-only JSON document, already serialized.
    #[serde(rename = "Data", skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "Ex", skip_serializing_if = "Option::is_none")]
    pub ex: Option<ErrorInfo>,
}

/// Asynchronous delivery client for [`LogMsg`]s produced by the sink.
///
/// Implementations own the wire protocol to the remote collector (HTTP,
/// queueing client, test capture, ...). The layer calls `enqueue` from a
/// background task and never awaits it on the application thread.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a single message to the backend.
    ///
    /// **Parameters**
    /// - `msg`: fully-populated [`LogMsg`] produced by the sink.
    ///
    /// **Returns**
    /// - `Ok(())` if the message was accepted by the backend.
    /// - `Err(..)` on transport failure (network error, HTTP status, ...).
    ///   The delivery loop treats this as transient and retries the batch
    ///   with backoff, up to a cap.
    async fn enqueue(&self, msg: &LogMsg) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush buffered messages and release any connections.
    ///
    /// Called exactly once when the host shuts the sink down via its
    /// shutdown guard; there is no implicit process-exit hook.
    ///
    /// Default implementation is a no-op.
    async fn flush_and_close(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
