//! Consumer-side reporting over counter snapshots.
//!
//! Builds per-process usage rows from a store snapshot, derives energy and
//! carbon estimates, renders the most carbon-intensive processes as a table
//! or as JSON lines, flags processes above an energy threshold, and
//! optionally prunes records whose process has exited. Everything here runs
//! on the reading side: the trackers never call into this module.

use crate::energy;
use crate::store::{CounterSnapshot, CounterStore};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown report format `{0}`, expected `table` or `json`")]
    UnknownFormat(String),
}

/// How a usage report is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(Error::UnknownFormat(other.to_owned())),
        }
    }
}

/// A single row of the usage report: raw counters plus derived estimates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UsageRow {
    pub pid: u32,
    pub cpu_time_ns: u64,
    pub context_switch_count: u64,
    pub packet_count: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub energy_joules: f64,
    pub carbon_kg: f64,
}

impl UsageRow {
    fn from_snapshot(pid: u32, snap: &CounterSnapshot) -> Self {
        let energy_joules = energy::estimate_energy(snap.cpu_time_ns, snap.packet_count);
        Self {
            pid,
            cpu_time_ns: snap.cpu_time_ns,
            context_switch_count: snap.context_switch_count,
            packet_count: snap.packet_count,
            bytes_sent: snap.bytes_sent,
            bytes_received: snap.bytes_received,
            energy_joules,
            carbon_kg: energy::estimate_carbon(energy_joules),
        }
    }
}

/// Builds report rows from a store snapshot, most carbon-intensive first.
///
/// Processes with no observed activity (no CPU time, no packets) are
/// omitted.
pub fn build_rows(snapshot: &[(u32, CounterSnapshot)]) -> Vec<UsageRow> {
    let mut rows: Vec<UsageRow> = snapshot
        .iter()
        .filter(|(_, snap)| snap.cpu_time_ns > 0 || snap.packet_count > 0)
        .map(|(pid, snap)| UsageRow::from_snapshot(*pid, snap))
        .collect();
    rows.sort_by(|a, b| b.carbon_kg.total_cmp(&a.carbon_kg));
    rows
}

/// Renders at most `top` rows as a fixed-width table with a header line.
pub fn render_table(rows: &[UsageRow], top: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>8}  {:>12}  {:>10}  {:>14}  {:>12}  {:>12}\n",
        "PID", "CPU(ms)", "Switches", "Packets", "Energy(J)", "Carbon(kg)"
    ));
    for row in rows.iter().take(top) {
        let cpu_ms = row.cpu_time_ns as f64 / 1_000_000.0;
        out.push_str(&format!(
            "{:>8}  {:>12.2}  {:>10}  {:>14}  {:>12.2}  {:>12.4}\n",
            row.pid, cpu_ms, row.context_switch_count, row.packet_count, row.energy_joules,
            row.carbon_kg
        ));
    }
    out
}

/// Renders at most `top` rows as newline-delimited JSON, one object per row.
///
/// # Errors
///
/// Returns a serialization error if a row cannot be encoded.
pub fn render_json(rows: &[UsageRow], top: usize) -> serde_json::Result<String> {
    let mut out = String::new();
    for row in rows.iter().take(top) {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    Ok(out)
}

/// Logs an advisory for every row whose energy estimate exceeds
/// `threshold_joules`, returning how many were flagged.
pub fn advise_mitigation(rows: &[UsageRow], threshold_joules: f64) -> usize {
    let mut flagged = 0;
    for row in rows {
        if row.energy_joules > threshold_joules {
            flagged += 1;
            log::warn!(
                target: "usage report",
                "pid={} exceeds energy threshold ({:.2} J > {:.2} J), consider throttling",
                row.pid,
                row.energy_joules,
                threshold_joules
            );
        }
    }
    flagged
}

/// Removes records whose process no longer exists, returning how many were
/// pruned.
///
/// Works against an already-reported snapshot so a process's final counters
/// are rendered at least once before its record is dropped.
pub fn prune_exited(store: &CounterStore, snapshot: &[(u32, CounterSnapshot)]) -> usize {
    let mut pruned = 0;
    for (pid, _) in snapshot {
        if !process_exists(*pid) {
            store.remove(*pid);
            pruned += 1;
        }
    }
    if pruned > 0 {
        log::debug!(target: "usage report", "pruned {pruned} exited processes");
    }
    pruned
}

fn process_exists(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(cpu_time_ns: u64, packets: u64) -> CounterSnapshot {
        CounterSnapshot {
            cpu_time_ns,
            packet_count: packets,
            ..CounterSnapshot::default()
        }
    }

    #[test]
    fn test_build_rows_omits_inactive() {
        let snapshot = vec![
            (1, active(1000, 0)),
            (2, CounterSnapshot::default()),
            (3, active(0, 5)),
        ];
        let rows = build_rows(&snapshot);
        let pids: Vec<u32> = rows.iter().map(|r| r.pid).collect();
        assert_eq!(pids.len(), 2);
        assert!(pids.contains(&1));
        assert!(pids.contains(&3));
    }

    #[test]
    fn test_build_rows_sorted_by_carbon_descending() {
        let snapshot = vec![(1, active(1000, 0)), (2, active(9000, 0)), (3, active(0, 1))];
        let rows = build_rows(&snapshot);
        assert_eq!(rows[0].pid, 2);
        assert_eq!(rows[1].pid, 1);
        assert_eq!(rows[2].pid, 3);
        assert!(rows[0].carbon_kg >= rows[1].carbon_kg);
    }

    #[test]
    fn test_render_table_limits_rows() {
        let snapshot: Vec<_> = (1..=5).map(|pid| (pid, active(1000, 0))).collect();
        let rows = build_rows(&snapshot);
        let table = render_table(&rows, 3);

        // Header plus three rows.
        assert_eq!(table.lines().count(), 4);
        assert!(table.starts_with(&format!("{:>8}", "PID")));
    }

    #[test]
    fn test_render_json_round_trips() {
        let rows = build_rows(&[(42, active(1000, 3))]);
        let body = render_json(&rows, 20).unwrap();

        let value: serde_json::Value = serde_json::from_str(body.trim()).unwrap();
        assert_eq!(value["pid"], 42);
        assert_eq!(value["cpu_time_ns"], 1000);
        assert_eq!(value["packet_count"], 3);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("table".parse::<ReportFormat>().unwrap(), ReportFormat::Table);
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("csv".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_advise_mitigation_flags_above_threshold() {
        let rows = build_rows(&[(1, active(10_000, 0)), (2, active(10, 0))]);
        // pid 1 estimates to 500 J, pid 2 to 0.5 J.
        assert_eq!(advise_mitigation(&rows, 100.0), 1);
        assert_eq!(advise_mitigation(&rows, 1000.0), 0);
    }

    #[test]
    fn test_prune_exited_removes_dead_pids() {
        let store = CounterStore::new();
        // No live process can own the largest representable pid.
        store.get_or_create(u32::MAX).unwrap();
        let snapshot = store.snapshot();

        assert_eq!(prune_exited(&store, &snapshot), 1);
        assert!(store.is_empty());
    }
}
