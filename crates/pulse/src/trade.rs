//! Read-only trade snapshots used for chart overlays.

use std::fmt;

/// Direction of a binary trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Up,
    Down,
}

impl TradeDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TradeDirection::Up => "UP",
            TradeDirection::Down => "DOWN",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Settled outcome of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeResult {
    Win,
    Loss,
    Draw,
}

/// A trade as reported by the host. The chart never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSnapshot {
    pub id: String,
    pub symbol: String,
    pub entry_price: f64,
    /// Entry time in epoch milliseconds.
    pub opened_at: i64,
    /// Expiration in epoch milliseconds.
    pub expiration: i64,
    pub direction: TradeDirection,
    pub stake: f64,
    pub result: Option<TradeResult>,
    pub profit: Option<f64>,
}

impl TradeSnapshot {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        direction: TradeDirection,
        entry_price: f64,
        opened_at: i64,
        expiration: i64,
        stake: f64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            entry_price,
            opened_at,
            expiration,
            direction,
            stake,
            result: None,
            profit: None,
        }
    }

    #[must_use]
    pub fn settled(mut self, result: TradeResult, profit: f64) -> Self {
        self.result = Some(result);
        self.profit = Some(profit);
        self
    }

    /// Unsettled and not yet expired.
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.result.is_none() && self.expiration > now_ms
    }

    pub fn is_for(&self, symbol: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol)
    }
}
