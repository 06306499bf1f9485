// 9.4 engine/liquidations.rs: the liquidation sweep. runs after every price
// batch for each touched asset. two phases: collect the order ids that
// crossed their stored liquidation price, then close them. the collect pass
// only reads the book, so marking can never observe a half-closed position.
//
// a liquidated position settles to nothing. the margin was already debited
// at open; no credit is ever issued here.

use super::core::Engine;
use super::results::ScanOutcome;
use crate::events::{PositionUpdate, StoreEvent};
use crate::math;
use crate::types::{Asset, OrderId};

impl Engine {
    pub fn check_liquidations(&mut self, asset: Asset) -> ScanOutcome {
        let Some(quote) = self.prices.get(asset).filter(|q| q.price > 0).copied() else {
            return ScanOutcome::default();
        };

        let mut outcome = ScanOutcome::default();
        // (order id, close price, price decimals, capped pnl)
        let mut doomed: Vec<(OrderId, i64, u32, i64)> = Vec::new();

        for position in self.ledger.open_positions_by_asset(asset) {
            outcome.scanned += 1;
            let close_price =
                match math::rescale_price(quote.price, quote.decimals, position.price_decimals) {
                    Ok(price) => price,
                    Err(err) => {
                        tracing::warn!(order_id = %position.order_id, error = %err, "scan skipped position");
                        outcome.skipped += 1;
                        continue;
                    }
                };
            match position.mark(close_price, position.price_decimals) {
                Ok(marked) if marked.liquidated => {
                    doomed.push((
                        position.order_id.clone(),
                        close_price,
                        position.price_decimals,
                        marked.pnl,
                    ));
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(order_id = %position.order_id, error = %err, "scan skipped position");
                    outcome.skipped += 1;
                }
            }
        }

        for (order_id, close_price, price_decimals, pnl) in doomed {
            let user_id = match self.ledger.close_position(&order_id) {
                Ok(position) => position.user_id.clone(),
                Err(err) => {
                    tracing::warn!(%order_id, error = %err, "liquidation close failed");
                    outcome.skipped += 1;
                    continue;
                }
            };
            tracing::info!(%order_id, %user_id, %asset, close_price, pnl, "position liquidated");
            self.emit_store(StoreEvent::UpdatePosition(PositionUpdate {
                order_id: order_id.clone(),
                close_price,
                price_decimals,
                pnl,
                liquidated: true,
            }));
            outcome.liquidated.push(order_id);
        }
        outcome
    }
}
