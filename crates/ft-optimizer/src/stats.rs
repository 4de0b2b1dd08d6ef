//! Percentile statistics over numeric samples.

use serde::{Deserialize, Serialize};

/// p50 / p90 / p99 of a sample set. Every field is `None` for an empty set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    pub p50: Option<f64>,
    pub p90: Option<f64>,
    pub p99: Option<f64>,
}

/// Percentile `p` (a fraction in `[0, 1]`) of `values`.
///
/// Linear interpolation between the two order statistics that bracket the
/// fractional rank `(n - 1) * p`. `p <= 0` gives the minimum, `p >= 1` the
/// maximum and an empty input gives `None`. The input order is irrelevant.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    if p <= 0.0 {
        return sorted.first().copied();
    }
    if p >= 1.0 {
        return sorted.last().copied();
    }

    let rank = (sorted.len() - 1) as f64 * p;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn summarize(values: &[f64]) -> PercentileSummary {
    PercentileSummary {
        p50: percentile(values, 0.5),
        p90: percentile(values, 0.9),
        p99: percentile(values, 0.99),
    }
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
