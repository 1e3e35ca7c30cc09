use std::sync::Arc;

/// Carbon Monitor: a per-process resource-usage telemetry aggregator.
///
/// This library consumes kernel-level events (scheduler context switches,
/// process creation, packet receive/transmit) and maintains cumulative
/// per-process counters: CPU time, context switches, packets and bytes
/// transferred. A periodic consumer derives energy and carbon estimates from
/// the counters and reports the most carbon-intensive processes.
pub mod config;
pub mod energy;
pub mod event;
pub mod report;
pub mod source;
pub mod store;
pub mod tracker;

use config::Config;
use report::ReportFormat;
use source::{EventSource, JsonLineSource};
use store::CounterStore;
use tracker::Aggregator;

/// Runs the Carbon Monitor application.
///
/// Wires the standard-input event source to the aggregation core, then
/// snapshots the counter store on a fixed interval, rendering a usage report
/// and advising on processes above the configured energy threshold.
///
/// # Errors
///
/// Returns an error if the environment configuration is malformed or the
/// event intake cannot be started. Failures while rendering a single report
/// are logged and the loop continues.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::from_env()?;
    log::debug!("config: {cfg:?}");

    let store = Arc::new(CounterStore::with_limit(cfg.max_tracked_processes));
    let aggregator = Arc::new(Aggregator::new(Arc::clone(&store)));

    let mut source = JsonLineSource::stdin();
    source.start(Arc::clone(&aggregator))?;
    log::debug!("event intake started");

    let mut interval = tokio::time::interval(cfg.report_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;

        let snapshot = {
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || {
                let mut out = Vec::with_capacity(store.len());
                let before = std::time::Instant::now();
                store.snapshot_into(&mut out);
                let took = before.elapsed();
                log::trace!("snapshot_into() took {} nanoseconds", took.as_nanos());
                out
            })
            .await
            .expect("spawn_blocking panicked")
        };

        let rows = report::build_rows(&snapshot);
        if rows.is_empty() {
            log::trace!("no significant process activity");
            continue;
        }

        match cfg.report_format {
            ReportFormat::Table => print!("{}", report::render_table(&rows, cfg.report_top)),
            ReportFormat::Json => match report::render_json(&rows, cfg.report_top) {
                Ok(body) => print!("{body}"),
                Err(err) => log::error!("failed to render report: {}", err),
            },
        }

        report::advise_mitigation(&rows, cfg.energy_alert_threshold);

        if cfg.prune_exited {
            report::prune_exited(&store, &snapshot);
        }
    }
}
