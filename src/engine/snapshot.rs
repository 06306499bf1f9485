// 9.5 engine/snapshot.rs: snapshot capture and restore on the engine.
// restore is a boot-time operation; it refuses a non-empty book. prices are
// deliberately not part of a snapshot, so after a restore every asset is
// PriceUnavailable until the feed speaks again.

use super::core::Engine;
use crate::ledger::LedgerError;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::types::Timestamp;

impl Engine {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.ledger, Timestamp::now())
    }

    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), LedgerError> {
        let balances = snapshot.balances.len();
        let open = snapshot.open_positions.len();
        let closed = snapshot.closed_positions.len();
        snapshot.restore_into(&mut self.ledger)?;
        tracing::info!(balances, open, closed, "restored ledger from snapshot");
        Ok(())
    }

    /// Write the current state out. Failures are logged and swallowed; a
    /// broken store must not take the trading loop down with it.
    pub fn save_snapshot_to(&self, store: &mut dyn SnapshotStore) {
        let snapshot = self.snapshot();
        let open = snapshot.open_positions.len();
        match store.save(&snapshot) {
            Ok(()) => tracing::debug!(open, "snapshot saved"),
            Err(err) => tracing::error!(error = %err, "snapshot save failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, OpenPositionCmd, TradeCommand};
    use crate::events::ErrorKind;
    use crate::price_table::PriceQuote;
    use crate::snapshot::MemorySnapshotStore;
    use crate::types::Asset;

    fn engine_with_open_position() -> Engine {
        let (mut engine, _rx) = Engine::new(EngineConfig::default());
        engine.apply_price_batch(vec![PriceQuote {
            asset: Asset::Eth,
            price: 50_000,
            decimals: 4,
        }]);
        let reply = engine.handle_trade(TradeCommand::Open(OpenPositionCmd {
            user_id: Some("alice".into()),
            order_id: Some("ord-1".into()),
            asset: Some("ETH".into()),
            side: Some("long".into()),
            margin: Some(100_000),
            leverage: Some(10),
            slippage_bps: Some(50),
        }));
        assert!(reply.success);
        engine
    }

    #[test]
    fn restored_engine_matches_the_source() {
        let engine = engine_with_open_position();
        let snapshot = engine.snapshot();

        let (mut fresh, _rx) = Engine::new(EngineConfig::default());
        fresh.restore(snapshot).unwrap();

        assert_eq!(fresh.ledger().account_count(), 1);
        assert_eq!(fresh.ledger().open_position_count(), 1);
        // bytes agree too
        assert_eq!(
            serde_json::to_string(&fresh.snapshot().balances).unwrap(),
            serde_json::to_string(&engine.snapshot().balances).unwrap(),
        );
    }

    #[test]
    fn restore_does_not_bring_prices_back() {
        let engine = engine_with_open_position();
        let snapshot = engine.snapshot();

        let (mut fresh, _rx) = Engine::new(EngineConfig::default());
        fresh.restore(snapshot).unwrap();
        assert!(fresh.prices().is_empty());

        // closing before a fresh tick is refused
        let reply = fresh.handle_trade(TradeCommand::Close(
            crate::engine::ClosePositionCmd {
                user_id: Some("alice".into()),
                order_id: Some("ord-1".into()),
            },
        ));
        assert_eq!(reply.error_kind, Some(ErrorKind::PriceUnavailable));
    }

    #[test]
    fn save_swallows_nothing_and_stores_everything() {
        let engine = engine_with_open_position();
        let mut store = MemorySnapshotStore::new();
        engine.save_snapshot_to(&mut store);
        engine.save_snapshot_to(&mut store);

        assert_eq!(store.saved_count(), 2);
        let latest = store.latest().unwrap();
        assert_eq!(latest.open_positions.len(), 1);
        assert_eq!(latest.balances.len(), 1);
    }
}
