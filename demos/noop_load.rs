use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use tracing_telemetry_sink::init::init_tracing;
use tracing_telemetry_sink::noop::NoopTransport;

#[tokio::main]
async fn main() {
    let transport = Arc::new(NoopTransport);
    let guard = init_tracing(transport);

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "noop load test error");
    }

    let elapsed = start.elapsed();
    println!(
        "default config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Drain whatever made it into the channel before exiting.
    guard.flush_and_close().await;
}
