use serde::{Deserialize, Serialize};

/// Percentile with linear interpolation between closest ranks
///
/// `p` is in `0..=100`. Returns 0.0 for an empty slice.
pub fn percentile(data: &[f64], p: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let index = (sorted.len() - 1) as f64 * p.clamp(0.0, 100.0) / 100.0;
    let lower = index.floor() as usize;
    let upper = lower + 1;
    let weight = index - lower as f64;

    if upper >= sorted.len() {
        return sorted[lower];
    }

    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Descriptive statistics over latency samples in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation, 0 for fewer than two samples
    pub stdev: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencyStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let count = samples.len();
        let mean = samples.iter().sum::<f64>() / count as f64;
        let stdev = if count > 1 {
            let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
                / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Self {
            count,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
            median: percentile(samples, 50.0),
            stdev,
            p50: percentile(samples, 50.0),
            p95: percentile(samples, 95.0),
            p99: percentile(samples, 99.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let data = [40.0, 10.0, 30.0, 20.0];
        assert_eq!(percentile(&data, 50.0), 25.0);
        assert_eq!(percentile(&data, 0.0), 10.0);
        assert_eq!(percentile(&data, 100.0), 40.0);
        assert!((percentile(&data, 95.0) - 38.5).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_is_monotonic() {
        let data: Vec<f64> = (0..37).map(|i| ((i * 7919) % 101) as f64).collect();
        let mut previous = f64::NEG_INFINITY;
        for p in 0..=100 {
            let value = percentile(&data, p as f64);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_percentile_edge_cases() {
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[7.5], 99.0), 7.5);
    }

    #[test]
    fn test_stats_over_samples() {
        let stats = LatencyStats::from_samples(&[100.0, 200.0, 300.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 300.0);
        assert_eq!(stats.mean, 200.0);
        assert_eq!(stats.median, 200.0);
        assert!((stats.stdev - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_degenerate_inputs() {
        assert_eq!(LatencyStats::from_samples(&[]), LatencyStats::default());

        let single = LatencyStats::from_samples(&[42.0]);
        assert_eq!(single.stdev, 0.0);
        assert_eq!(single.p95, 42.0);
    }
}
