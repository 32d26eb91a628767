//! Per-metric score statistics.

#![cfg_attr(not(feature = "native"), allow(dead_code))]

use serde::Serialize;

/// Descriptive statistics over one metric's per-frame scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Average of the two middle values for an even count.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl Summary {
    /// Returns `None` for an empty slice.
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns 0 for empty or mismatched series, and when either is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() || x.len() != y.len() {
        return 0.0;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut num, mut den_x, mut den_y) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    let den = (den_x * den_y).sqrt();
    if den == 0.0 { 0.0 } else { num / den }
}

/// Absolute Pearson correlation for every pair of series, as
/// `(first, second, |r|)` index triples in input order.
pub fn pairwise_correlations(series: &[Vec<f64>]) -> Vec<(usize, usize, f64)> {
    let mut pairs = Vec::new();
    for (i, x) in series.iter().enumerate() {
        for (j, y) in series.iter().enumerate().skip(i + 1) {
            if x.is_empty() || x.len() != y.len() {
                continue;
            }
            pairs.push((i, j, pearson(x, y).abs()));
        }
    }
    pairs
}
