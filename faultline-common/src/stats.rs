//! Timing aggregation over iteration durations.
//!
//! Percentiles use the nearest-rank method: sort ascending, take
//! `rank = ceil(p * n)` clamped to `[1, n]`, and return the sample at that
//! rank. No interpolation, so every reported value is a real sample.

use serde::{Deserialize, Serialize};

/// Nearest-rank percentile of `values` at proportion `p` (0 < p <= 1).
///
/// Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    nearest_rank(&sorted, p)
}

fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let rank = (p * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

/// Summary statistics over a set of durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingStats {
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl TimingStats {
    /// Aggregate `samples`; an empty slice yields all zeros.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            avg: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p50: nearest_rank(&sorted, 0.50),
            p95: nearest_rank(&sorted, 0.95),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percentile_empty_is_zero() {
        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(percentile(&[], 0.95), 0.0);
        assert_eq!(percentile(&[], 1.0), 0.0);
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        // ceil(0.95 * 5) = 5
        assert_eq!(percentile(&xs, 0.95), 5.0);
        // ceil(0.5 * 5) = 3
        assert_eq!(percentile(&xs, 0.50), 3.0);
        // ceil(0.2 * 5) = 1
        assert_eq!(percentile(&xs, 0.20), 1.0);
        assert_eq!(percentile(&xs, 1.0), 5.0);
    }

    #[test]
    fn test_percentile_twenty_samples_picks_nineteenth() {
        let xs: Vec<f64> = (1..=20).rev().map(f64::from).collect();
        assert_eq!(percentile(&xs, 0.95), 19.0);
        assert_eq!(percentile(&xs, 0.50), 10.0);
    }

    #[test]
    fn test_percentile_unsorted_input() {
        let xs = [0.9, 0.1, 0.5, 0.3];
        assert_eq!(percentile(&xs, 0.50), 0.3);
        assert_eq!(percentile(&xs, 0.95), 0.9);
    }

    #[test]
    fn test_percentile_tiny_proportion_clamps_to_first() {
        let xs = [4.0, 2.0, 8.0];
        assert_eq!(percentile(&xs, 0.0), 2.0);
        assert_eq!(percentile(&xs, 0.001), 2.0);
    }

    #[test]
    fn test_timing_stats_empty() {
        let stats = TimingStats::from_samples(&[]);
        assert_eq!(stats, TimingStats::default());
        assert_eq!(stats.avg, 0.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
    }

    #[test]
    fn test_timing_stats_values() {
        let stats = TimingStats::from_samples(&[0.4, 0.2, 0.6, 0.8]);
        assert!((stats.avg - 0.5).abs() < 1e-9);
        assert_eq!(stats.min, 0.2);
        assert_eq!(stats.max, 0.8);
        assert_eq!(stats.p50, 0.4);
        assert_eq!(stats.p95, 0.8);
    }

    proptest! {
        #[test]
        fn prop_percentile_one_is_max(xs in prop::collection::vec(0.0f64..1000.0, 1..64)) {
            let max = xs.iter().cloned().fold(f64::MIN, f64::max);
            prop_assert_eq!(percentile(&xs, 1.0), max);
        }

        #[test]
        fn prop_percentile_is_a_sample(
            xs in prop::collection::vec(0.0f64..1000.0, 1..64),
            p in 0.01f64..=1.0,
        ) {
            let value = percentile(&xs, p);
            prop_assert!(xs.contains(&value));
        }

        #[test]
        fn prop_stats_are_ordered(xs in prop::collection::vec(0.0f64..1000.0, 1..64)) {
            let stats = TimingStats::from_samples(&xs);
            prop_assert!(stats.min <= stats.p50);
            prop_assert!(stats.p50 <= stats.p95);
            prop_assert!(stats.p95 <= stats.max);
            prop_assert!(stats.min <= stats.avg + 1e-9 && stats.avg <= stats.max + 1e-9);
        }
    }
}
