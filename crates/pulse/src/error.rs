//! Error types for the chart engine.

use pulse_core::ParseTimeframeError;
use pulse_data::TickError;
use thiserror::Error;

/// Why a tick was not applied. The engine state is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickRejected {
    /// A tick with this timestamp was already processed.
    #[error("duplicate tick at {0}")]
    Duplicate(i64),
    /// The tick is older than one already applied to the same bucket.
    #[error("stale tick at {timestamp}, last applied tick was at {last}")]
    Stale { timestamp: i64, last: i64 },
    /// The tick belongs to a bucket before the live one.
    #[error("late tick for bucket {bucket}, current bucket is {current}")]
    LateTick { bucket: i64, current: i64 },
    /// The feed already closed this bucket.
    #[error("bucket {bucket} is already closed")]
    AlreadyClosed { bucket: i64 },
    #[error(transparent)]
    Invalid(#[from] TickError),
}

/// Configuration the engine refuses. The prior configuration stays active.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    InvalidTimeframe(#[from] ParseTimeframeError),
    #[error("unknown indicator kind '{0}'")]
    UnknownIndicatorKind(String),
    #[error("indicator '{id}' has invalid period {period}")]
    InvalidPeriod { id: String, period: usize },
    #[error("indicator id '{0}' is used more than once")]
    DuplicateIndicatorId(String),
    #[error("unknown chart style '{0}'")]
    UnknownChartStyle(String),
    #[error("unknown theme '{0}'")]
    UnknownTheme(String),
    #[error("invalid viewport settings: {0}")]
    InvalidViewport(String),
}
