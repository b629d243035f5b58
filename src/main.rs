/// Entry point of the process sampler.
///
/// Samples memory and CPU usage of one process every cycle and logs the readings as JSON.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=info SAMPLE_PID=1234 SAMPLE_INTERVAL_SECS=5 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    proc_sampler::run().await
}
