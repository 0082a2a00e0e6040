use crate::transport::{LogMsg, Transport};
use async_trait::async_trait;
use std::error::Error;

/// A transport that simply drops every message.
///
/// Useful for measuring the overhead of the layer and formatter without any
/// external I/O, and for unit tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn enqueue(&self, _msg: &LogMsg) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
