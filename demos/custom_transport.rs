use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use tracing_telemetry_sink::{
    init::init_tracing,
    transport::{LogMsg, Transport},
};

/// Example of integrating a completely custom delivery client by
/// implementing the `Transport` trait directly. Imagine this talks to some
/// proprietary collector for which this crate does not provide a built-in
/// transport.
struct MyCustomCollector;

#[async_trait]
impl Transport for MyCustomCollector {
    async fn enqueue(&self, msg: &LogMsg) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Here you would call your own client library for the target
        // collector. For the sake of example we just print the message.
        println!("[my-collector] {} {} data={:?}", msg.level, msg.msg, msg.data);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let transport: Arc<dyn Transport> = Arc::new(MyCustomCollector);

    let guard = init_tracing(transport);

    info!("custom transport example started");
    error!(collector = "my-collector", "simulated error sent via custom transport");

    guard.flush_and_close().await;
}
