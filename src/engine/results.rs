// 9.0.2: result and error types for engine operations.

use crate::events::ErrorKind;
use crate::ledger::LedgerError;
use crate::math::MathError;
use crate::types::{minor_units, Asset, OrderId};
use serde::{Deserialize, Serialize};

/// Why a command was rejected. Carries enough context for a useful log line;
/// the wire only ever sees the [`ErrorKind`] plus the rendered message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("missing required parameters")]
    MissingParameters,

    #[error("unsupported asset: {0:?}")]
    InvalidAsset(String),

    #[error("invalid side: {0:?} (expected \"long\" or \"short\")")]
    InvalidSide(String),

    #[error("margin {margin} below minimum {min}")]
    InvalidMargin { margin: i64, min: i64 },

    #[error("leverage {0} out of range")]
    InvalidLeverage(u32),

    #[error("slippage {0} bps out of range")]
    InvalidSlippage(u32),

    #[error("no price available for {0}")]
    PriceUnavailable(Asset),

    #[error("insufficient margin: have {available}, need {requested}")]
    InsufficientMargin { available: i64, requested: i64 },

    #[error("order id {0} already exists")]
    DuplicateOrderId(OrderId),

    #[error("position {0} not found")]
    PositionNotFound(OrderId),

    #[error("position {0} belongs to another user")]
    Unauthorized(OrderId),

    #[error("position {0} is already closed")]
    AlreadyClosed(OrderId),

    #[error("division by zero in position math")]
    DivisionByZero,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::MissingParameters => ErrorKind::MissingParameters,
            CommandError::InvalidAsset(_) => ErrorKind::InvalidAsset,
            CommandError::InvalidSide(_) => ErrorKind::InvalidSide,
            CommandError::InvalidMargin { .. } => ErrorKind::InvalidMargin,
            CommandError::InvalidLeverage(_) => ErrorKind::InvalidLeverage,
            CommandError::InvalidSlippage(_) => ErrorKind::InvalidSlippage,
            CommandError::PriceUnavailable(_) => ErrorKind::PriceUnavailable,
            CommandError::InsufficientMargin { .. } => ErrorKind::InsufficientMargin,
            CommandError::DuplicateOrderId(_) => ErrorKind::DuplicateOrderId,
            CommandError::PositionNotFound(_) => ErrorKind::PositionNotFound,
            CommandError::Unauthorized(_) => ErrorKind::Unauthorized,
            CommandError::AlreadyClosed(_) => ErrorKind::AlreadyClosed,
            CommandError::DivisionByZero => ErrorKind::DivisionByZero,
            CommandError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<MathError> for CommandError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::DivisionByZero => CommandError::DivisionByZero,
            MathError::Overflow => CommandError::Internal(err.to_string()),
        }
    }
}

impl From<LedgerError> for CommandError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                available,
                requested,
                ..
            } => CommandError::InsufficientMargin {
                available,
                requested,
            },
            LedgerError::DuplicateOrderId(id) => CommandError::DuplicateOrderId(id),
            LedgerError::PositionNotFound(id) => CommandError::PositionNotFound(id),
            LedgerError::AlreadyClosed(id) => CommandError::AlreadyClosed(id),
            LedgerError::BalanceOverflow | LedgerError::NotEmpty => {
                CommandError::Internal(err.to_string())
            }
        }
    }
}

/// Reply payload for a successful close. `usdc_balance` is the wallet after
/// settlement so the caller never needs a follow-up balance query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseResult {
    pub order_id: OrderId,
    #[serde(with = "minor_units")]
    pub close_price: i64,
    pub price_decimals: u32,
    #[serde(with = "minor_units")]
    pub pnl: i64,
    pub liquidated: bool,
    /// USDC minor units credited back to the wallet.
    #[serde(with = "minor_units")]
    pub settled: i64,
    #[serde(with = "minor_units")]
    pub usdc_balance: i64,
}

/// What one liquidation pass over an asset did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub scanned: usize,
    pub liquidated: Vec<OrderId>,
    /// Positions whose mark failed numerically. Logged and left open.
    pub skipped: usize,
}

impl ScanOutcome {
    pub fn merge(&mut self, other: ScanOutcome) {
        self.scanned += other.scanned;
        self.liquidated.extend(other.liquidated);
        self.skipped += other.skipped;
    }
}
