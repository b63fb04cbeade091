//! # Feed Statistics
//! Pure reduction of a numeric series to a (score, velocity, trust) triple.
//!
//! No I/O, no state; safe to call any number of times with the same input.

/// Aggregate triple for one feed series.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeedStats {
    pub score: f64,
    pub velocity: f64,
    pub trust: f64,
}

/// Reduce an ordered series to its aggregate triple.
///
/// * `score`: arithmetic mean of the series.
/// * `velocity`: (last - first) / max(len - 1, 1); a single sample moves at 0.
/// * `trust`: 1 / (1 + population stdev), in (0, 1]; exactly 1 when all
///   elements are equal.
///
/// All three outputs are rounded to 3 decimals. An empty series reduces to
/// all zeros.
pub fn calc(series: &[f64]) -> FeedStats {
    if series.is_empty() {
        return FeedStats::default();
    }
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;

    let steps = series.len().saturating_sub(1).max(1) as f64;
    let velocity = (series[series.len() - 1] - series[0]) / steps;

    let variance = series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let trust = 1.0 / (1.0 + variance.sqrt());

    FeedStats {
        score: round3(mean),
        velocity: round3(velocity),
        trust: round3(trust),
    }
}

/// Round to 3 decimal places (wire precision).
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
