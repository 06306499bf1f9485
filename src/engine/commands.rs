// 9.2 engine/commands.rs: the command processor. every wallet and trade
// command lands here after ingress, already deserialized but *not* yet
// validated: this file is the single validation point, so a command that was
// malformed on the wire and one that was malformed in-process fail the same
// way. validation runs strictly before any mutation; the one rollback case
// (duplicate order id after the margin debit) refunds before replying.

use super::core::Engine;
use super::results::{CloseResult, CommandError};
use crate::events::{PositionUpdate, Reply, StoreEvent};
use crate::math;
use crate::position::Position;
use crate::types::{Asset, BalanceAsset, OrderId, Side, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum WalletCommand {
    InitWallet {
        user_id: Option<String>,
    },
    GetBalance {
        user_id: Option<String>,
    },
    GetAssetBalance {
        user_id: Option<String>,
        asset: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub enum TradeCommand {
    Open(OpenPositionCmd),
    Close(ClosePositionCmd),
}

/// Raw open request. Everything is optional here; the processor decides
/// what "missing" means so the error kind is consistent for every caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPositionCmd {
    pub user_id: Option<String>,
    /// Assigned by the engine when absent; pass one for idempotent retries.
    pub order_id: Option<String>,
    pub asset: Option<String>,
    pub side: Option<String>,
    pub margin: Option<i64>,
    pub leverage: Option<u32>,
    pub slippage_bps: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePositionCmd {
    pub user_id: Option<String>,
    pub order_id: Option<String>,
}

impl Engine {
    pub fn handle_wallet(&mut self, cmd: WalletCommand) -> Reply {
        let result = match cmd {
            WalletCommand::InitWallet { user_id } => self.init_wallet(user_id),
            WalletCommand::GetBalance { user_id } => self.get_balance(user_id),
            WalletCommand::GetAssetBalance { user_id, asset } => {
                self.get_asset_balance(user_id, asset)
            }
        };
        into_reply(result)
    }

    pub fn handle_trade(&mut self, cmd: TradeCommand) -> Reply {
        let result = match cmd {
            TradeCommand::Open(cmd) => self.open_position(cmd),
            TradeCommand::Close(cmd) => self.close_position(cmd),
        };
        into_reply(result)
    }

    // init and get share a path: both seed on first touch and return the
    // whole wallet
    fn init_wallet(&mut self, user_id: Option<String>) -> Result<Value, CommandError> {
        let user_id = required_user(user_id)?;
        let fresh = self.ledger.balance(&user_id).is_none();
        let account = self.ledger.get_or_create_balance(&user_id).clone();
        if fresh {
            tracing::info!(user_id = %account.user_id, usdc = account.usdc.amount, "initialized balance");
        }
        to_data(&account)
    }

    fn get_balance(&mut self, user_id: Option<String>) -> Result<Value, CommandError> {
        self.init_wallet(user_id)
    }

    fn get_asset_balance(
        &mut self,
        user_id: Option<String>,
        asset: Option<String>,
    ) -> Result<Value, CommandError> {
        let user_id = required_user(user_id)?;
        let raw = asset.ok_or(CommandError::MissingParameters)?;
        let asset = BalanceAsset::parse(&raw).ok_or(CommandError::InvalidAsset(raw))?;
        let slot = *self.ledger.get_or_create_balance(&user_id).get(asset);
        Ok(serde_json::json!({
            "asset": asset.symbol(),
            "amount": slot.amount.to_string(),
            "decimals": slot.decimals,
        }))
    }

    // 9.2.1: open. validation order is part of the contract: the first
    // failing check names the error kind the caller sees.
    fn open_position(&mut self, cmd: OpenPositionCmd) -> Result<Value, CommandError> {
        let user_id = required_user(cmd.user_id)?;
        let asset_raw = cmd.asset.ok_or(CommandError::MissingParameters)?;
        let side_raw = cmd.side.ok_or(CommandError::MissingParameters)?;
        let margin = cmd.margin.ok_or(CommandError::MissingParameters)?;
        let leverage = cmd.leverage.ok_or(CommandError::MissingParameters)?;
        let slippage_bps = cmd.slippage_bps.ok_or(CommandError::MissingParameters)?;

        let asset = Asset::parse(&asset_raw).ok_or(CommandError::InvalidAsset(asset_raw))?;
        let side = Side::parse(&side_raw).ok_or(CommandError::InvalidSide(side_raw))?;

        let limits = &self.config.limits;
        if !limits.margin_ok(margin) {
            return Err(CommandError::InvalidMargin {
                margin,
                min: limits.min_margin,
            });
        }
        if !limits.leverage_ok(leverage) {
            return Err(CommandError::InvalidLeverage(leverage));
        }
        if !limits.slippage_ok(slippage_bps) {
            return Err(CommandError::InvalidSlippage(slippage_bps));
        }

        let quote = self
            .prices
            .get(asset)
            .filter(|q| q.price > 0)
            .copied()
            .ok_or(CommandError::PriceUnavailable(asset))?;

        let available = self.ledger.get_or_create_balance(&user_id).usdc.amount;
        if available < margin {
            return Err(CommandError::InsufficientMargin {
                available,
                requested: margin,
            });
        }

        let order_id = OrderId::new(
            cmd.order_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        );
        // the liquidation price must exist before any money moves
        let position = Position::open(
            order_id.clone(),
            user_id.clone(),
            asset,
            side,
            margin,
            leverage,
            slippage_bps,
            quote.price,
            quote.decimals,
            Timestamp::now(),
        )?;

        self.ledger
            .adjust_balance(&user_id, BalanceAsset::Usdc, -margin)?;
        if let Err(err) = self.ledger.open_position(position.clone()) {
            if let Err(refund) = self
                .ledger
                .adjust_balance(&user_id, BalanceAsset::Usdc, margin)
            {
                tracing::error!(%user_id, %order_id, error = %refund, "margin refund failed after rejected open");
            }
            return Err(err.into());
        }

        tracing::info!(
            %order_id,
            %user_id,
            %asset,
            %side,
            margin,
            leverage,
            entry_price = position.entry_price,
            liquidation_price = position.liquidation_price,
            "position opened"
        );
        self.emit_store(StoreEvent::CreatePosition(position.clone()));
        to_data(&position)
    }

    // 9.2.2: close. pnl is marked against the *stored* liquidation price;
    // it is never recomputed from current inputs, so a close and a scan can
    // never disagree about whether the position was gone.
    fn close_position(&mut self, cmd: ClosePositionCmd) -> Result<Value, CommandError> {
        let user_id = required_user(cmd.user_id)?;
        let order_id = OrderId::new(cmd.order_id.ok_or(CommandError::MissingParameters)?);

        let position = self
            .ledger
            .position(&order_id)
            .cloned()
            .ok_or_else(|| CommandError::PositionNotFound(order_id.clone()))?;
        if position.user_id != user_id {
            return Err(CommandError::Unauthorized(order_id));
        }
        if !position.is_open() {
            return Err(CommandError::AlreadyClosed(order_id));
        }

        let quote = self
            .prices
            .get(position.asset)
            .filter(|q| q.price > 0)
            .copied()
            .ok_or(CommandError::PriceUnavailable(position.asset))?;
        let close_price =
            math::rescale_price(quote.price, quote.decimals, position.price_decimals)?;
        let outcome = position.mark(close_price, position.price_decimals)?;
        let settled = position.settlement_amount(outcome);

        // credit before the status flip: a refused credit must leave the
        // position open, and past the checks above the flip cannot fail
        if settled > 0 {
            self.ledger
                .adjust_balance(&user_id, BalanceAsset::Usdc, settled)?;
        }
        self.ledger.close_position(&order_id)?;
        let usdc_balance = self.ledger.get_or_create_balance(&user_id).usdc.amount;

        tracing::info!(
            %order_id,
            %user_id,
            close_price,
            pnl = outcome.pnl,
            liquidated = outcome.liquidated,
            settled,
            "position closed"
        );
        self.emit_store(StoreEvent::UpdatePosition(PositionUpdate {
            order_id: order_id.clone(),
            close_price,
            price_decimals: position.price_decimals,
            pnl: outcome.pnl,
            liquidated: outcome.liquidated,
        }));

        to_data(&CloseResult {
            order_id,
            close_price,
            price_decimals: position.price_decimals,
            pnl: outcome.pnl,
            liquidated: outcome.liquidated,
            settled,
            usdc_balance,
        })
    }
}

fn required_user(user_id: Option<String>) -> Result<UserId, CommandError> {
    user_id
        .filter(|id| !id.is_empty())
        .map(UserId::new)
        .ok_or(CommandError::MissingParameters)
}

fn to_data<T: Serialize>(value: &T) -> Result<Value, CommandError> {
    serde_json::to_value(value).map_err(|e| CommandError::Internal(e.to_string()))
}

fn into_reply(result: Result<Value, CommandError>) -> Reply {
    match result {
        Ok(data) => Reply::ok(data),
        Err(err) => {
            tracing::debug!(kind = ?err.kind(), error = %err, "command rejected");
            Reply::err(err.kind(), err.to_string())
        }
    }
}
