/// Entry point for the Carbon Monitor telemetry aggregator.
///
/// This binary reads newline-delimited JSON kernel events from standard
/// input (produced by whatever probe mechanism observes the kernel),
/// accumulates per-process usage counters, and prints a usage report with
/// energy and carbon estimates on a fixed interval.
///
/// # Errors
///
/// Returns an error if initialization fails (e.g., malformed environment
/// configuration or an unreadable event stream).
///
/// # Examples
///
/// ```bash
/// event-source | REPORT_FORMAT=json cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    carbon_monitor::run().await
}
