//! Sample statistics.

/// Arithmetic mean of a sample. Returns 0.0 for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation with one delta degree of freedom.
///
/// Returns 0.0 for samples with fewer than two observations, so callers
/// can treat a degenerate series as riskless rather than NaN-poisoned.
pub fn sample_std(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let ss: f64 = samples.iter().map(|x| (x - m) * (x - m)).sum();
    (ss / (samples.len() - 1) as f64).sqrt()
}
