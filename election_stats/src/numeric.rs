// Summary statistics over plain samples.
//
// Undefined results (empty samples, zero denominators, a single observation
// for a sample deviation) are NaN and never a panic.

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Standard deviation with the unbiased (n - 1) estimator.
pub(crate) fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (sq / (n - 1) as f64).sqrt()
}

/// Quantile `q` in [0, 1] with linear interpolation between closest ranks.
///
/// The input must be sorted in increasing order.
pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted {
        [] => f64::NAN,
        [x] => *x,
        _ => {
            let pos = q * (sorted.len() - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// `num / den * 100`, NaN when the base is zero.
///
/// The multiplication happens first so that exact ratios stay exact.
pub(crate) fn pct(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        f64::NAN
    } else {
        num * 100.0 / den
    }
}

pub(crate) fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut res = values.to_vec();
    res.sort_by(|a, b| a.total_cmp(b));
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::assert_close;

    #[test]
    fn sample_deviation() {
        assert_close(sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.138089935299395);
        assert!(sample_std_dev(&[3.0]).is_nan());
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn interpolated_quartiles() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_close(percentile(&v, 0.25), 1.75);
        assert_close(percentile(&v, 0.5), 2.5);
        assert_close(percentile(&v, 0.75), 3.25);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn percentages() {
        assert_eq!(pct(750.0, 1000.0), 75.0);
        assert_eq!(pct(200.0, 1000.0), 20.0);
        assert!(pct(1.0, 0.0).is_nan());
    }
}
