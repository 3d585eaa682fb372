//! Statistical helpers shared by the feature builder, backends and fallback.

use statrs::statistics::Statistics;

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    Statistics::mean(values)
}

/// Population standard deviation (denominator n). NaN for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    if values.len() == 1 {
        return 0.0;
    }
    Statistics::population_std_dev(values)
}

/// Largest value. NaN for an empty slice.
pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Smallest value. NaN for an empty slice.
pub fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Least-squares line through (index, value) pairs.
///
/// Returns `(slope, intercept)`; slope is 0 for fewer than two points.
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (0.0, values[0]);
    }

    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / nf;

    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        ss_xx += dx * dx;
        ss_xy += dx * (y - mean_y);
    }

    if ss_xx.abs() < 1e-12 {
        return (0.0, mean_y);
    }

    let slope = ss_xy / ss_xx;
    (slope, mean_y - slope * mean_x)
}

/// Slope of the best-fit line over the index.
pub fn slope(values: &[f64]) -> f64 {
    linear_fit(values).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn population_std_uses_n_denominator() {
        // Population variance of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 4
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(population_std(&values), 2.0, epsilon = 1e-10);
        assert_relative_eq!(population_std(&[3.0]), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn extremes() {
        let values = [3.0, -1.0, 7.5, 2.0];
        assert_eq!(max(&values), 7.5);
        assert_eq!(min(&values), -1.0);
        assert!(max(&[]).is_nan());
    }

    #[test]
    fn slope_of_perfect_line() {
        let values: Vec<f64> = (0..7).map(|i| 3.0 + 2.0 * i as f64).collect();
        let (slope, intercept) = linear_fit(&values);
        assert_relative_eq!(slope, 2.0, epsilon = 1e-10);
        assert_relative_eq!(intercept, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn slope_of_constant_is_zero() {
        assert_relative_eq!(slope(&[4.0; 7]), 0.0, epsilon = 1e-12);
        assert_eq!(slope(&[5.0]), 0.0);
        assert_eq!(linear_fit(&[]), (0.0, 0.0));
    }
}
