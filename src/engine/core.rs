// 9.1 engine/core.rs: the engine proper. owns the ledger and the price
// table; nothing else ever holds a writable reference to either. all
// mutation enters through the command and pricing paths in the sibling
// modules, which are impl blocks on this struct.

use super::config::EngineConfig;
use crate::events::StoreEvent;
use crate::ledger::Ledger;
use crate::price_table::PriceTable;
use tokio::sync::mpsc;

pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) ledger: Ledger,
    pub(super) prices: PriceTable,
    pub(super) store_tx: mpsc::UnboundedSender<StoreEvent>,
}

impl Engine {
    /// Builds an engine plus the receiving end of its persistence stream.
    /// Dropping the receiver is allowed; store events are then discarded.
    pub fn new(config: EngineConfig) -> (Self, mpsc::UnboundedReceiver<StoreEvent>) {
        let (store_tx, store_rx) = mpsc::unbounded_channel();
        (
            Self {
                config,
                ledger: Ledger::new(),
                prices: PriceTable::new(),
                store_tx,
            },
            store_rx,
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    // store delivery is best-effort. a closed receiver loses the event and
    // the engine keeps serving; the snapshot still captures the state.
    pub(super) fn emit_store(&self, event: StoreEvent) {
        if self.store_tx.send(event).is_err() {
            tracing::debug!("store stream closed, event dropped");
        }
    }
}
