// 5.0: the book. every balance and every position lives here, owned by
// exactly one writer. all mutation goes through the handful of methods below
// so the insufficient-funds and duplicate-id checks cannot be bypassed.

use crate::balance::AccountBalance;
use crate::position::Position;
use crate::types::{Asset, BalanceAsset, OrderId, PositionStatus, UserId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient {asset} balance: have {available}, need {requested}")]
    InsufficientFunds {
        asset: BalanceAsset,
        available: i64,
        requested: i64,
    },
    #[error("order id {0} already exists")]
    DuplicateOrderId(OrderId),
    #[error("position {0} not found")]
    PositionNotFound(OrderId),
    #[error("position {0} is already closed")]
    AlreadyClosed(OrderId),
    #[error("balance adjustment overflowed")]
    BalanceOverflow,
    #[error("refusing to restore into a populated ledger")]
    NotEmpty,
}

#[derive(Debug, Default)]
pub struct Ledger {
    balances: HashMap<UserId, AccountBalance>,
    positions: HashMap<OrderId, Position>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet for `user_id`, created with the starting grant on first touch.
    pub fn get_or_create_balance(&mut self, user_id: &UserId) -> &AccountBalance {
        self.balances
            .entry(user_id.clone())
            .or_insert_with(|| AccountBalance::seed(user_id.clone()))
    }

    /// Read-only lookup. Does not seed.
    pub fn balance(&self, user_id: &UserId) -> Option<&AccountBalance> {
        self.balances.get(user_id)
    }

    // 5.1: the only way money moves. seeds the account if needed, applies the
    // signed delta, and returns the new amount. a debit past zero rejects the
    // whole adjustment and leaves the balance untouched.
    pub fn adjust_balance(
        &mut self,
        user_id: &UserId,
        asset: BalanceAsset,
        delta: i64,
    ) -> Result<i64, LedgerError> {
        let account = self
            .balances
            .entry(user_id.clone())
            .or_insert_with(|| AccountBalance::seed(user_id.clone()));
        let slot = account.get_mut(asset);
        let next = slot
            .amount
            .checked_add(delta)
            .ok_or(LedgerError::BalanceOverflow)?;
        if next < 0 {
            return Err(LedgerError::InsufficientFunds {
                asset,
                available: slot.amount,
                requested: delta.saturating_abs(),
            });
        }
        slot.amount = next;
        Ok(next)
    }

    // 5.2: positions. order ids are never reused, even after close.
    pub fn open_position(&mut self, position: Position) -> Result<(), LedgerError> {
        use std::collections::hash_map::Entry;
        match self.positions.entry(position.order_id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::DuplicateOrderId(position.order_id)),
            Entry::Vacant(slot) => {
                slot.insert(position);
                Ok(())
            }
        }
    }

    pub fn position(&self, order_id: &OrderId) -> Option<&Position> {
        self.positions.get(order_id)
    }

    /// Flips an open position to closed and returns it. Closed entries stay
    /// in the book so they land in the next snapshot.
    pub fn close_position(&mut self, order_id: &OrderId) -> Result<&Position, LedgerError> {
        let position = self
            .positions
            .get_mut(order_id)
            .ok_or_else(|| LedgerError::PositionNotFound(order_id.clone()))?;
        if position.status == PositionStatus::Closed {
            return Err(LedgerError::AlreadyClosed(order_id.clone()));
        }
        position.status = PositionStatus::Closed;
        Ok(position)
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(|p| p.is_open())
    }

    pub fn open_positions_by_asset(&self, asset: Asset) -> impl Iterator<Item = &Position> {
        self.open_positions().filter(move |p| p.asset == asset)
    }

    pub fn closed_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(|p| !p.is_open())
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountBalance> {
        self.balances.values()
    }

    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    pub fn open_position_count(&self) -> usize {
        self.open_positions().count()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty() && self.positions.is_empty()
    }

    // 5.3: bulk load for snapshot restore. only a virgin ledger accepts one;
    // anything else means restore ran after live traffic, which would clobber
    // balances users already moved.
    pub fn load(
        &mut self,
        accounts: Vec<AccountBalance>,
        positions: Vec<Position>,
    ) -> Result<(), LedgerError> {
        if !self.is_empty() {
            return Err(LedgerError::NotEmpty);
        }
        for account in accounts {
            self.balances.insert(account.user_id.clone(), account);
        }
        for position in positions {
            self.positions.insert(position.order_id.clone(), position);
        }
        Ok(())
    }
}
