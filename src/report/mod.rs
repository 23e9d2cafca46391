//! Formatted terminal output for ingestion runs.
//!
//! We keep formatting code in one place so:
//! - the pipeline stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::{PairStatus, RunReport};

/// Format one job's per-pair outcomes and totals.
pub fn format_run_report(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== efeed - {} [{}] ===\n",
        report.job,
        report.policy.label()
    ));
    for pair in &report.pairs {
        match &pair.status {
            PairStatus::Written { fetched, written, malformed } => {
                let duplicates = fetched.saturating_sub(*written);
                out.push_str(&format!(
                    "  {}: {written} written ({fetched} fetched, {duplicates} duplicate, {malformed} malformed)\n",
                    pair.label
                ));
            }
            PairStatus::Empty => {
                out.push_str(&format!("  {}: no data (skipped)\n", pair.label));
            }
            PairStatus::Failed(reason) => {
                out.push_str(&format!("  {}: FAILED: {reason}\n", pair.label));
            }
        }
    }
    out.push_str(&format!(
        "  total: {} written, {} skipped, {} failed\n",
        report.written(),
        report.skipped(),
        report.failed()
    ));
    out
}

/// Final completion marker across every job of the run.
pub fn format_completion(reports: &[RunReport]) -> String {
    let written: usize = reports.iter().map(RunReport::written).sum();
    let failed: usize = reports.iter().map(RunReport::failed).sum();
    format!("done: {written} rows written, {failed} failed pair(s).")
}
