//! Spread statistics over per-iteration samples
//!
//! The averaged result hides how noisy a crawler was between iterations.
//! These helpers summarize the raw iteration values for the text report.

use serde::Serialize;

/// Percentile of `samples` with linear interpolation between ranks.
///
/// Returns `None` for an empty slice or `p` outside `0.0..=100.0`.
///
/// ```
/// use crawl_bench::stats::percentile;
///
/// assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), Some(2.5));
/// assert_eq!(percentile(&[], 50.0), None);
/// ```
pub fn percentile(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Min, max, median, mean and sample standard deviation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spread {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl Spread {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let median = percentile(samples, 50.0)?;
        let count = samples.len();

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = samples.iter().sum::<f64>() / count as f64;

        let std_dev = if count > 1 {
            let squared: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
            (squared / (count - 1) as f64).sqrt()
        } else {
            0.0
        };

        Some(Self {
            min,
            max,
            median,
            mean,
            std_dev,
            count,
        })
    }

    /// Relative variability (std_dev / mean), infinite when the mean is zero
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            f64::INFINITY
        } else {
            self.std_dev / self.mean
        }
    }
}
