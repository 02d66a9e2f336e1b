//! Notification type definitions.

use pulse_core::Candle;

/// Something the host may want to react to.
///
/// Notifications are queued while the engine processes a tick or a frame
/// and drained by the host afterwards, in the order they were raised.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Automatic rollover moved the timeline to the next cycle.
    TimestampsAdvanced { deadline: i64, expiration: i64 },
    /// The animated price moved this frame.
    PriceUpdated { price: f64 },
    /// A candle was finalized and appended to history.
    CandleClosed { candle: Candle },
    /// The timeline was frozen to, or released from, an active trade.
    TradeFreezeChanged { frozen: bool },
    /// Indicator series were rebuilt from the start of history.
    IndicatorsRecomputed,
}

impl Notification {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Notification::TimestampsAdvanced { .. } => "timestamps-advanced",
            Notification::PriceUpdated { .. } => "price-updated",
            Notification::CandleClosed { .. } => "candle-closed",
            Notification::TradeFreezeChanged { .. } => "trade-freeze-changed",
            Notification::IndicatorsRecomputed => "indicators-recomputed",
        }
    }
}
