//! Empirical quantile estimators.
//!
//! The unweighted estimator interpolates linearly between order statistics
//! at position `h = (n - 1) * q` (Hyndman-Fan type 7, the default of most
//! statistics packages). The weighted estimator interpolates on
//! cumulative-weight midpoints and reduces to the unweighted rule's
//! behaviour at the median for equal weights.

/// Linear-interpolation quantile of a sample.
///
/// Position `h = (n - 1) * q`; the result interpolates between the
/// surrounding order statistics. The input does not need to be sorted.
///
/// Returns `None` for an empty sample or `q` outside `[0, 1]`. NaN inputs
/// are the caller's responsibility; upstream validation keeps them out of
/// metric inputs.
///
/// # Examples
/// ```
/// use risk_core::math::quantile;
///
/// let xs = [4.0, 1.0, 3.0, 2.0];
/// assert_eq!(quantile(&xs, 0.0), Some(1.0));
/// assert_eq!(quantile(&xs, 0.5), Some(2.5));
/// assert_eq!(quantile(&xs, 1.0), Some(4.0));
/// ```
pub fn quantile(samples: &[f64], q: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Weighted quantile via cumulative-weight midpoints.
///
/// Samples are sorted by value; sample `k` is assigned the position
/// `(cum_k - w_k / 2) / W` where `cum_k` is the cumulative weight up to and
/// including `k` and `W` the total weight. The quantile interpolates
/// linearly between bracketing positions and clamps to the extreme values
/// outside them.
///
/// Returns `None` for empty inputs, mismatched lengths, `q` outside
/// `[0, 1]`, any negative weight, or a non-positive total weight.
pub fn weighted_quantile(values: &[f64], weights: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || values.len() != weights.len() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    if weights.iter().any(|&w| w < 0.0) {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    // Midpoint positions of the sorted samples in [0, 1].
    let mut positions = Vec::with_capacity(order.len());
    let mut cum = 0.0;
    for &idx in &order {
        let w = weights[idx];
        positions.push((cum + 0.5 * w) / total);
        cum += w;
    }

    let first = order[0];
    let last = *order.last().expect("non-empty by the guard above");
    if q <= positions[0] {
        return Some(values[first]);
    }
    if q >= *positions.last().expect("non-empty by the guard above") {
        return Some(values[last]);
    }

    // Find the bracketing pair and interpolate.
    let upper = positions.partition_point(|&p| p < q);
    let lower = upper - 1;
    let (p_lo, p_hi) = (positions[lower], positions[upper]);
    let (v_lo, v_hi) = (values[order[lower]], values[order[upper]]);
    if p_hi == p_lo {
        return Some(v_hi);
    }
    let frac = (q - p_lo) / (p_hi - p_lo);
    Some(v_lo + frac * (v_hi - v_lo))
}
