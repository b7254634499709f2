//! Windowing strategies that feed slices (or running state) to primitives.
//!
//! Each strategy reports its burn-in so callers can tell how many points
//! must exist before the first output.

use super::primitives::{ema_step, gain_loss, mean, rsi_from_averages, wilder_step};

/// Common behavior shared by every windowing strategy.
pub trait WindowStrategy {
    /// The number of data points required before the first output.
    fn burn_in(&self) -> usize;
}

/// Fixed-size sliding window that only emits complete windows.
#[derive(Debug, Clone, Copy)]
pub struct RollingWindow {
    size: usize,
}

impl RollingWindow {
    pub fn new(size: usize) -> Self {
        RollingWindow { size }
    }

    /// Applies `primitive` to every complete window; output `k` covers
    /// `data[k..k + size]`. Empty when `size` is zero or exceeds the data.
    pub fn apply<F, T>(&self, data: &[f64], primitive: F) -> Vec<T>
    where
        F: FnMut(&[f64]) -> T,
    {
        if self.size == 0 || data.len() < self.size {
            return Vec::new();
        }
        data.windows(self.size).map(primitive).collect()
    }
}

impl WindowStrategy for RollingWindow {
    fn burn_in(&self) -> usize {
        self.size
    }
}

/// Exponential smoothing seeded with the simple average of the first
/// `period` values.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialWindow {
    period: usize,
    multiplier: f64,
}

impl ExponentialWindow {
    pub fn new(period: usize) -> Self {
        ExponentialWindow {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Output `k` corresponds to `data[period - 1 + k]`.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        if self.period == 0 || data.len() < self.period {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(data.len() - self.period + 1);
        let mut previous = mean(&data[..self.period]);
        result.push(previous);

        for &value in &data[self.period..] {
            previous = ema_step(previous, value, self.multiplier);
            result.push(previous);
        }

        result
    }
}

impl WindowStrategy for ExponentialWindow {
    fn burn_in(&self) -> usize {
        self.period
    }
}

/// Wilder-smoothed gain/loss averages turned into RSI values.
#[derive(Debug, Clone, Copy)]
pub struct WilderWindow {
    period: usize,
}

impl WilderWindow {
    pub fn new(period: usize) -> Self {
        WilderWindow { period }
    }

    /// Output `k` corresponds to `data[period + k]`.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        if self.period == 0 || data.len() <= self.period {
            return Vec::new();
        }

        let changes: Vec<f64> = data.windows(2).map(|pair| pair[1] - pair[0]).collect();
        let (mut avg_gain, mut avg_loss) = changes[..self.period]
            .iter()
            .map(|&change| gain_loss(change))
            .fold((0.0, 0.0), |(g, l), (gain, loss)| (g + gain, l + loss));
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;

        let mut result = Vec::with_capacity(changes.len() - self.period + 1);
        result.push(rsi_from_averages(avg_gain, avg_loss));

        for &change in &changes[self.period..] {
            let (gain, loss) = gain_loss(change);
            avg_gain = wilder_step(avg_gain, gain, self.period);
            avg_loss = wilder_step(avg_loss, loss, self.period);
            result.push(rsi_from_averages(avg_gain, avg_loss));
        }

        result
    }
}

impl WindowStrategy for WilderWindow {
    fn burn_in(&self) -> usize {
        self.period.saturating_add(1)
    }
}
