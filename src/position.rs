// 4.0: one leveraged position. immutable after open except for status; the
// liquidation price is computed exactly once here and reused verbatim by the
// mark path so open, scan and close can never disagree on the threshold.

use crate::math::{self, MathError, PnlOutcome};
use crate::types::{minor_units, Asset, OrderId, PositionStatus, Side, Timestamp, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub asset: Asset,
    pub side: Side,
    /// USDC minor units, already debited from the wallet.
    #[serde(with = "minor_units")]
    pub margin: i64,
    pub leverage: u32,
    /// Max tolerated entry slippage in basis points. Recorded for the order
    /// record; fills are simulated at the quoted price.
    pub slippage_bps: u32,
    #[serde(with = "minor_units")]
    pub entry_price: i64,
    #[serde(with = "minor_units")]
    pub liquidation_price: i64,
    /// Scale of `entry_price` and `liquidation_price` at open time.
    pub price_decimals: u32,
    pub status: PositionStatus,
    pub opened_at: Timestamp,
}

impl Position {
    /// Builds an open position, deriving the liquidation price from the
    /// entry. Fails only if the math does (zero entry, zero margin, overflow).
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        order_id: OrderId,
        user_id: UserId,
        asset: Asset,
        side: Side,
        margin: i64,
        leverage: u32,
        slippage_bps: u32,
        entry_price: i64,
        price_decimals: u32,
        opened_at: Timestamp,
    ) -> Result<Self, MathError> {
        let liquidation_price =
            math::liquidation_price(side, entry_price, margin, leverage, price_decimals)?;
        Ok(Self {
            order_id,
            user_id,
            asset,
            side,
            margin,
            leverage,
            slippage_bps,
            entry_price,
            liquidation_price,
            price_decimals,
            status: PositionStatus::Open,
            opened_at,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    // 4.1: mark against a quote. the quote's scale may drift from the scale
    // this position was opened at; rescale before comparing against the
    // stored liquidation price.
    pub fn mark(&self, price: i64, price_decimals: u32) -> Result<PnlOutcome, MathError> {
        let current = math::rescale_price(price, price_decimals, self.price_decimals)?;
        math::profit_and_loss(
            self.side,
            self.entry_price,
            current,
            self.margin,
            self.leverage,
            self.price_decimals,
            self.liquidation_price,
        )
    }

    // 4.2: what the wallet gets back at close. liquidated positions return
    // nothing; a loss can never push the payout below zero.
    pub fn settlement_amount(&self, outcome: PnlOutcome) -> i64 {
        if outcome.liquidated {
            0
        } else {
            self.margin.saturating_add(outcome.pnl).max(0)
        }
    }
}
