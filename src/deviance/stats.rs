// Column statistics with dataframe semantics
//
// NaN marks a missing value and is skipped by every reduction here. A column
// with no finite values reduces to NaN rather than to zero so that degenerate
// input stays visible to the caller.

/// Arithmetic mean of the finite values, NaN when there are none
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Population standard deviation (denominator N), NaN when empty
pub fn population_std(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    let (sq, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + (v - m).powi(2), n + 1));
    (sq / count as f64).sqrt()
}

/// Sum of squared deviations from the column's own mean
///
/// NaN when the column has no finite values.
pub fn sum_squared_deviations(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| (v - m).powi(2))
        .sum()
}

/// True when standardizing the column cannot produce finite values
pub fn is_degenerate(values: &[f64]) -> bool {
    let std = population_std(values);
    std.is_nan() || std == 0.0
}

/// Z-score a column with its own mean and population std
///
/// A constant or empty column yields all NaN.
pub fn standardize(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let std = population_std(values);
    if std.is_nan() || std == 0.0 {
        return vec![f64::NAN; values.len()];
    }
    values.iter().map(|v| (v - m) / std).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_skips_nan() {
        assert_eq!(mean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(mean(&[]).is_nan());
        assert!(mean(&[f64::NAN]).is_nan());
    }

    #[test]
    fn test_population_std() {
        // mean=5, squared deviations 9+1+1+9=20, 20/4=5
        let std = population_std(&[2.0, 4.0, 6.0, 8.0]);
        assert!((std - 5.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(population_std(&[7.0, 7.0]), 0.0);
    }

    #[test]
    fn test_sum_squared_deviations() {
        assert_eq!(sum_squared_deviations(&[1.0, 3.0]), 2.0);
        assert_eq!(sum_squared_deviations(&[5.0, f64::NAN, 7.0]), 2.0);
        assert_eq!(sum_squared_deviations(&[4.0]), 0.0);
        assert!(sum_squared_deviations(&[]).is_nan());
    }

    #[test]
    fn test_standardize_unit_variance() {
        let z = standardize(&[1.0, 2.0, 3.0, 4.0]);
        assert!(mean(&z).abs() < 1e-12);
        assert!((population_std(&z) - 1.0).abs() < 1e-12);
        // N standardized values always carry deviance N
        assert!((sum_squared_deviations(&z) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_standardize_constant_is_nan() {
        let z = standardize(&[2.0, 2.0, 2.0]);
        assert!(z.iter().all(|v| v.is_nan()));
        assert!(is_degenerate(&[2.0, 2.0, 2.0]));
        assert!(!is_degenerate(&[2.0, 3.0]));
    }

    #[test]
    fn test_standardize_keeps_missing_positions() {
        let z = standardize(&[1.0, f64::NAN, 3.0]);
        assert_eq!(z[0], -1.0);
        assert!(z[1].is_nan());
        assert_eq!(z[2], 1.0);
    }
}
