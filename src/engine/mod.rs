// 9.0: the trading engine. single-owner state machine over the ledger and
// price table; every mutation enters through a handle_* method or the price
// path. deterministic given the same command sequence, no I/O of its own.

mod commands;
mod config;
mod core;
mod liquidations;
mod pricing;
mod results;
mod snapshot;

pub use commands::{ClosePositionCmd, OpenPositionCmd, TradeCommand, WalletCommand};
pub use config::EngineConfig;
pub use core::Engine;
pub use results::{CloseResult, CommandError, ScanOutcome};
