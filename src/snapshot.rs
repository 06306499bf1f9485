// 8.0: point-in-time capture of the whole book, and the store seam it is
// saved through. the engine only ever restores into an empty ledger, at
// boot, before the first event is consumed.

use crate::balance::AccountBalance;
use crate::ledger::{Ledger, LedgerError};
use crate::position::Position;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialized book state. Every section defaults to empty so a partial
/// snapshot (older writer, hand-edited fixture) still restores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub taken_at: Timestamp,
    #[serde(default)]
    pub balances: Vec<AccountBalance>,
    #[serde(default)]
    pub open_positions: Vec<Position>,
    #[serde(default)]
    pub closed_positions: Vec<Position>,
}

impl Snapshot {
    /// Captures the ledger. Sections are sorted by key so two captures of
    /// the same state are byte-identical.
    pub fn capture(ledger: &Ledger, taken_at: Timestamp) -> Self {
        let mut balances: Vec<_> = ledger.accounts().cloned().collect();
        balances.sort_by(|a, b| a.user_id.as_str().cmp(b.user_id.as_str()));

        let mut open_positions: Vec<_> = ledger.open_positions().cloned().collect();
        open_positions.sort_by(|a, b| a.order_id.as_str().cmp(b.order_id.as_str()));

        let mut closed_positions: Vec<_> = ledger.closed_positions().cloned().collect();
        closed_positions.sort_by(|a, b| a.order_id.as_str().cmp(b.order_id.as_str()));

        Self {
            taken_at,
            balances,
            open_positions,
            closed_positions,
        }
    }

    /// Loads this snapshot into `ledger`. Fails with `NotEmpty` if the
    /// ledger has seen any traffic.
    pub fn restore_into(self, ledger: &mut Ledger) -> Result<(), LedgerError> {
        let mut positions = self.open_positions;
        positions.extend(self.closed_positions);
        ledger.load(self.balances, positions)
    }
}

// 8.1: persistence seam. the engine does not care where snapshots land.
pub trait SnapshotStore: Send {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError>;
    fn load_latest(&mut self) -> Result<Option<Snapshot>, SnapshotError>;
}

/// Keeps every saved snapshot in memory. Clones share the same backing
/// vector, so a test can hold one clone and give the engine another.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    saved: Arc<Mutex<Vec<Snapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_count(&self) -> usize {
        self.lock().len()
    }

    pub fn latest(&self) -> Option<Snapshot> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Snapshot>> {
        // a poisoned lock still holds valid snapshots
        self.saved.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.lock().push(snapshot.clone());
        Ok(())
    }

    fn load_latest(&mut self) -> Result<Option<Snapshot>, SnapshotError> {
        Ok(self.latest())
    }
}

/// Single-file JSON store. Each save overwrites the previous snapshot; the
/// write goes through a sibling temp file and a rename so a crash mid-save
/// never leaves a torn snapshot behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load_latest(&mut self) -> Result<Option<Snapshot>, SnapshotError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, BalanceAsset, OrderId, Side, UserId};

    fn populated_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .adjust_balance(&UserId::new("alice"), BalanceAsset::Usdc, -100_000)
            .unwrap();
        ledger.get_or_create_balance(&UserId::new("bob"));
        for (id, user) in [("ord-1", "alice"), ("ord-2", "bob")] {
            ledger
                .open_position(
                    Position::open(
                        OrderId::new(id),
                        UserId::new(user),
                        Asset::Btc,
                        Side::Long,
                        100_000,
                        10,
                        50,
                        500_000_000,
                        4,
                        Timestamp::from_millis(0),
                    )
                    .unwrap(),
                )
                .unwrap();
        }
        ledger.close_position(&OrderId::new("ord-2")).unwrap();
        ledger
    }

    #[test]
    fn capture_then_restore_preserves_the_book() {
        let ledger = populated_ledger();
        let snapshot = Snapshot::capture(&ledger, Timestamp::from_millis(1_000));

        assert_eq!(snapshot.balances.len(), 2);
        assert_eq!(snapshot.open_positions.len(), 1);
        assert_eq!(snapshot.closed_positions.len(), 1);

        let mut restored = Ledger::new();
        snapshot.clone().restore_into(&mut restored).unwrap();
        assert_eq!(
            Snapshot::capture(&restored, Timestamp::from_millis(1_000)),
            snapshot
        );
    }

    #[test]
    fn restore_into_populated_ledger_fails() {
        let mut ledger = populated_ledger();
        let snapshot = Snapshot::capture(&ledger, Timestamp::from_millis(1_000));
        assert_eq!(
            snapshot.restore_into(&mut ledger).unwrap_err(),
            LedgerError::NotEmpty
        );
    }

    #[test]
    fn partial_snapshot_sections_default_to_empty() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"balances":[]}"#).unwrap();
        assert!(snapshot.open_positions.is_empty());
        assert!(snapshot.closed_positions.is_empty());

        let mut ledger = Ledger::new();
        snapshot.restore_into(&mut ledger).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn memory_store_returns_the_latest() {
        let mut store = MemorySnapshotStore::new();
        assert!(store.load_latest().unwrap().is_none());

        let ledger = populated_ledger();
        store
            .save(&Snapshot::capture(&ledger, Timestamp::from_millis(1)))
            .unwrap();
        store
            .save(&Snapshot::capture(&ledger, Timestamp::from_millis(2)))
            .unwrap();

        assert_eq!(store.saved_count(), 2);
        assert_eq!(
            store.load_latest().unwrap().unwrap().taken_at,
            Timestamp::from_millis(2)
        );
    }

    #[test]
    fn file_store_roundtrip() {
        let path = std::env::temp_dir().join(format!("tradesim-snap-{}.json", uuid::Uuid::new_v4()));
        let mut store = JsonFileStore::new(&path);
        assert!(store.load_latest().unwrap().is_none());

        let snapshot = Snapshot::capture(&populated_ledger(), Timestamp::from_millis(42));
        store.save(&snapshot).unwrap();

        let loaded = store.load_latest().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        std::fs::remove_file(&path).unwrap();
    }
}
