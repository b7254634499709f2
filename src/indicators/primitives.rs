//! Stateless numeric primitives used by the indicator calculations.
//!
//! These are pure functions over slices of values and compose with the
//! windowing strategies in [`super::windows`].

/// Arithmetic mean of a window. Returns `f64::NAN` for an empty window.
pub fn mean(window: &[f64]) -> f64 {
    if window.is_empty() {
        return f64::NAN;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

/// Calculates the population standard deviation of available (non-NaN) values.
pub fn population_std_dev(values: &[f64]) -> f64 {
    let valid_values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();

    if valid_values.is_empty() {
        return f64::NAN;
    }

    let n = valid_values.len() as f64;
    let mean = valid_values.iter().sum::<f64>() / n;
    let sum_squared_diff: f64 = valid_values
        .iter()
        .map(|&value| (value - mean).powi(2))
        .sum();

    (sum_squared_diff / n).sqrt()
}

/// Computes the next value of an exponential moving average.
pub fn ema_step(previous: f64, value: f64, multiplier: f64) -> f64 {
    (value - previous) * multiplier + previous
}

/// Wilder smoothing: `(previous * (period - 1) + value) / period`.
pub fn wilder_step(previous: f64, value: f64, period: usize) -> f64 {
    let n = period as f64;
    (previous * (n - 1.0) + value) / n
}

/// Splits a price move into its (gain, loss) parts; both are non-negative.
pub fn gain_loss(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, change.abs())
    }
}

/// Relative strength index from average gain and loss. A zero average loss
/// pins the relative strength at 100.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 { 100.0 } else { avg_gain / avg_loss };
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_window() {
        assert_eq!(mean(&[10.0, 12.0, 11.0]), 11.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn population_std_dev_ignores_nan() {
        let values = vec![1.0, 2.0, f64::NAN, 3.0];
        let result = population_std_dev(&values);
        assert!((result - 0.816496580927726).abs() < 1e-12);
    }

    #[test]
    fn population_std_dev_empty_returns_nan() {
        assert!(population_std_dev(&[]).is_nan());
    }

    #[test]
    fn ema_step_with_zero_multiplier_keeps_previous() {
        assert_eq!(ema_step(42.0, 50.0, 0.0), 42.0);
    }

    #[test]
    fn ema_step_weights_new_value_and_previous() {
        let second = ema_step(100.0, 110.0, 0.1);
        assert!((second - (0.1 * 110.0 + 0.9 * 100.0)).abs() < 1e-12);
    }

    #[test]
    fn wilder_step_smooths_towards_value() {
        assert_eq!(wilder_step(1.0, 15.0, 14), 2.0);
    }

    #[test]
    fn gain_loss_splits_moves() {
        assert_eq!(gain_loss(2.5), (2.5, 0.0));
        assert_eq!(gain_loss(-1.5), (0.0, 1.5));
        assert_eq!(gain_loss(0.0), (0.0, 0.0));
    }

    #[test]
    fn rsi_from_averages_handles_zero_loss() {
        assert_eq!(rsi_from_averages(1.0, 1.0), 50.0);
        assert!((rsi_from_averages(1.0, 0.0) - (100.0 - 100.0 / 101.0)).abs() < 1e-12);
    }
}
