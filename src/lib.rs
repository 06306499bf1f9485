// tradesim-core: leveraged trading simulator engine.
// ledger-first architecture: every mutation flows through one serialized
// path, money is fixed-point integers, and state survives restarts via
// snapshots.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: UserId, OrderId, Asset, Side, Timestamp
//   2.x  math.rs: liquidation price and pnl in fixed-point
//   3.x  balance.rs: per-user multi-asset balances
//   4.x  position.rs: leveraged position lifecycle
//   5.x  ledger.rs: the book of balances and positions
//   6.x  price_table.rs: latest tick per asset
//   7.x  events.rs: replies and persistence events
//   8.x  snapshot.rs: ledger dump/load and snapshot stores
//   9.x  engine/: commands, liquidation sweep, pricing, snapshots
//   10.x ingress.rs: wire frames, engine queue, worker task
//   11.x config.rs: trade limits

// core ledger modules
pub mod balance;
pub mod ledger;
pub mod math;
pub mod position;
pub mod price_table;
pub mod types;

// engine and boundary modules
pub mod config;
pub mod engine;
pub mod events;
pub mod ingress;
pub mod snapshot;

// re exports for convenience
pub use balance::{AccountBalance, AssetBalance, STARTING_USDC};
pub use config::TradeLimits;
pub use engine::{
    ClosePositionCmd, CloseResult, CommandError, Engine, EngineConfig, OpenPositionCmd,
    ScanOutcome, TradeCommand, WalletCommand,
};
pub use events::{ErrorKind, PositionUpdate, Reply, ReplyHandle, ReplySink, StoreEvent};
pub use ingress::{spawn, EngineEvent, EngineHandle};
pub use ledger::{Ledger, LedgerError};
pub use math::{MathError, PnlOutcome};
pub use position::Position;
pub use price_table::{PriceQuote, PriceTable, MAX_PRICE_DECIMALS};
pub use snapshot::{JsonFileStore, MemorySnapshotStore, Snapshot, SnapshotStore};
pub use types::{Asset, BalanceAsset, OrderId, PositionStatus, Side, Timestamp, UserId};
