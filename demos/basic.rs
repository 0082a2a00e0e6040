use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use tracing_telemetry_sink::env::{env_or, TELEMETRY_SINK_URL_ENV};
use tracing_telemetry_sink::init::init_tracing;
#[cfg(feature = "http")]
use tracing_telemetry_sink::http::{HttpConfig, HttpTransport};

#[tokio::main]
async fn main() {
    #[cfg(feature = "http")]
    {
        let config = HttpConfig {
            url: env_or(TELEMETRY_SINK_URL_ENV, "http://localhost:9880"),
            api_key: None,
            app_name: Some("broadcast-demo".to_string()),
        };
        let transport = Arc::new(HttpTransport::new(config));
        let guard = init_tracing(transport);

        info!("starting service");

        for iteration in 0..5u64 {
            error!(iteration, name = "Emergency Broadcast", "broadcast system test failed");
            sleep(Duration::from_secs(2)).await;
        }

        // Explicit shutdown: drain the queue and close the transport.
        guard.flush_and_close().await;
    }
}
