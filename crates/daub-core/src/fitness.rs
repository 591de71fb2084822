//! Error-vector arithmetic shared by evaluation, selection and reporting.
//!
//! An evaluated individual carries one non-negative penalty per test case;
//! `total_error` is their sum and the quantity tournament selection
//! minimizes. Epsilon-lexicase selection additionally needs the population
//! standard deviation of a single case column, computed here.

use serde::{Deserialize, Serialize};

/// Penalty assigned to every test case when a program produces no output
/// on the expected stack. Large enough that any individual that produced
/// an output, however bad, outranks one that produced none.
pub const MISSING_OUTPUT_PENALTY: f64 = 1_000_000.0;

/// Sum of per-case penalties.
pub fn total_error(errors: &[f64]) -> f64 {
    errors.iter().sum()
}

/// Population standard deviation (divide by n) of one case column.
///
/// Returns 0.0 for an empty column, so a degenerate pool filters on the
/// exact minimum.
pub fn case_std_dev(column: &[f64]) -> f64 {
    if column.is_empty() {
        return 0.0;
    }
    let n = column.len() as f64;
    let mean = column.iter().sum::<f64>() / n;
    let variance = column.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Aggregate error statistics over a population, for per-generation
/// reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

impl ErrorStats {
    /// Compute statistics from total errors. Returns `None` for an empty
    /// iterator.
    pub fn from_totals(totals: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut best = f64::INFINITY;
        let mut worst = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;

        for total in totals {
            best = best.min(total);
            worst = worst.max(total);
            sum += total;
            count += 1;
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            best,
            mean: sum / count as f64,
            worst,
        })
    }
}
