//! `bgc balance` reporting: one line per audited cell, then a summary.

use std::io::Write;

use anyhow::{Result, bail};
use bgc_config::EvaluationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceOutcome {
    pub audited: usize,
    pub failed: usize,
}

/// Write the per-cell verdicts and fail if any cell exceeds `tolerance`.
pub fn write_balance(
    report: &EvaluationReport,
    tolerance: f64,
    out: &mut impl Write,
) -> Result<BalanceOutcome> {
    let mut outcome = BalanceOutcome {
        audited: 0,
        failed: 0,
    };
    for cell in &report.cells {
        let Some(audit) = cell.audit else { continue };
        outcome.audited += 1;
        if audit.is_balanced(tolerance) {
            writeln!(out, "cell {} ({}): balanced", cell.index, cell.domain)?;
            continue;
        }
        outcome.failed += 1;
        let gap = audit.discrepancy();
        tracing::warn!(
            cell = cell.index,
            dn = gap.nitrogen,
            dp = gap.phosphorus,
            dc = gap.carbon,
            "mass-balance discrepancy"
        );
        writeln!(
            out,
            "cell {} ({}): IMBALANCED dN={:+.3e} dP={:+.3e} dC={:+.3e} dO={:+.3e}",
            cell.index, cell.domain, gap.nitrogen, gap.phosphorus, gap.carbon, gap.oxygen_demand
        )?;
    }
    writeln!(
        out,
        "audited {} cell(s), {} imbalanced",
        outcome.audited, outcome.failed
    )?;
    if outcome.failed > 0 {
        bail!(
            "{} cell(s) exceed tolerance {tolerance:e}",
            outcome.failed
        );
    }
    Ok(outcome)
}
