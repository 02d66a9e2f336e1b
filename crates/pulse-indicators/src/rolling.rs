//! Rolling building blocks shared by the moving-average style indicators.

use std::collections::VecDeque;

/// Fixed-length window of the most recent prices.
#[derive(Debug, Clone)]
pub(crate) struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    pub(crate) fn new(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period),
        }
    }

    pub(crate) fn push(&mut self, price: f64) {
        if self.values.len() == self.period {
            self.values.pop_front();
        }
        self.values.push_back(price);
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    /// Prices the window would hold after pushing `price`, oldest first.
    /// `None` until that would fill the window.
    fn with_next(&self, price: f64) -> Option<impl Iterator<Item = f64> + '_> {
        if self.period == 0 || self.values.len() + 1 < self.period {
            return None;
        }
        let skip = (self.values.len() + 1).saturating_sub(self.period);
        Some(
            self.values
                .iter()
                .copied()
                .skip(skip)
                .chain(std::iter::once(price)),
        )
    }

    /// Mean of the window if `price` were pushed next.
    pub(crate) fn mean_with(&self, price: f64) -> Option<f64> {
        let sum: f64 = self.with_next(price)?.sum();
        Some(sum / self.period as f64)
    }

    /// Mean and population standard deviation if `price` were pushed next.
    pub(crate) fn mean_std_with(&self, price: f64) -> Option<(f64, f64)> {
        let mean = self.mean_with(price)?;
        let var = self
            .with_next(price)?
            .map(|p| {
                let d = p - mean;
                d * d
            })
            .sum::<f64>()
            / self.period as f64;
        Some((mean, var.max(0.0).sqrt()))
    }
}

/// Streaming EMA seeded with the SMA of the first `period` prices.
#[derive(Debug, Clone)]
pub(crate) struct EmaState {
    period: usize,
    seen: usize,
    seed_sum: f64,
    value: Option<f64>,
}

impl EmaState {
    pub(crate) fn new(period: usize) -> Self {
        Self {
            period,
            seen: 0,
            seed_sum: 0.0,
            value: None,
        }
    }

    fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// EMA after `price`, without committing.
    pub(crate) fn next(&self, price: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        match self.value {
            Some(prev) => Some((price - prev) * self.multiplier() + prev),
            None if self.seen + 1 == self.period => {
                Some((self.seed_sum + price) / self.period as f64)
            }
            None => None,
        }
    }

    pub(crate) fn push(&mut self, price: f64) -> Option<f64> {
        let next = self.next(price);
        if self.value.is_none() {
            self.seen += 1;
            self.seed_sum += price;
        }
        if next.is_some() {
            self.value = next;
        }
        next
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.period);
    }
}
