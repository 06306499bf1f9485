// 10.0 ingress.rs: the single serialized path into the engine. price ticks,
// wallet commands and trade commands from any number of producers funnel
// into one bounded channel consumed by one task that owns the engine. that
// task is the only writer the ledger ever sees.
//
// 10.1: wire frames and their parsers
// 10.2: EngineEvent and EngineHandle
// 10.3: spawn and the event loop

use crate::engine::{
    ClosePositionCmd, Engine, EngineConfig, OpenPositionCmd, TradeCommand, WalletCommand,
};
use crate::events::{ErrorKind, Reply, ReplyHandle, StoreEvent};
use crate::price_table::PriceQuote;
use crate::snapshot::SnapshotStore;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// 10.1: frames as they arrive from the transport. every field is optional
// at this layer; the command processor decides what missing means. the
// price frame is the one place where bad input is dropped instead of
// answered, because a tick has nobody to answer to.

#[derive(Debug, Default, Deserialize)]
struct PriceFrame {
    #[serde(default)]
    price_updates: Vec<serde_json::Value>,
}

/// Parse one price frame. Malformed entries are logged and dropped, good
/// entries in the same frame still apply.
pub fn parse_price_frame(payload: &str) -> Vec<PriceQuote> {
    let frame: PriceFrame = match serde_json::from_str(payload) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable price frame");
            return Vec::new();
        }
    };
    let mut quotes = Vec::with_capacity(frame.price_updates.len());
    for entry in frame.price_updates {
        match serde_json::from_value::<PriceQuote>(entry) {
            Ok(quote) => quotes.push(quote),
            Err(err) => tracing::warn!(error = %err, "dropping malformed price update"),
        }
    }
    quotes
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalletFrame {
    pub user_id: Option<String>,
    pub command: Option<String>,
    pub asset: Option<String>,
}

impl WalletFrame {
    pub fn into_command(self) -> Result<WalletCommand, Reply> {
        match self.command.as_deref() {
            Some("InitWallet") => Ok(WalletCommand::InitWallet {
                user_id: self.user_id,
            }),
            Some("GetBalance") => Ok(WalletCommand::GetBalance {
                user_id: self.user_id,
            }),
            Some("GetAssetBalance") => Ok(WalletCommand::GetAssetBalance {
                user_id: self.user_id,
                asset: self.asset,
            }),
            other => {
                tracing::warn!(command = ?other, "unknown wallet command");
                Err(Reply::err(
                    ErrorKind::MissingParameters,
                    "unknown or missing command",
                ))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TradeFrame {
    pub user_id: Option<String>,
    pub command: Option<String>,
    pub order_id: Option<String>,
    pub asset: Option<String>,
    pub side: Option<String>,
    pub margin: Option<i64>,
    pub leverage: Option<u32>,
    pub slippage_bps: Option<u32>,
}

impl TradeFrame {
    pub fn into_command(self) -> Result<TradeCommand, Reply> {
        match self.command.as_deref() {
            Some("OpenPosition") => Ok(TradeCommand::Open(OpenPositionCmd {
                user_id: self.user_id,
                order_id: self.order_id,
                asset: self.asset,
                side: self.side,
                margin: self.margin,
                leverage: self.leverage,
                slippage_bps: self.slippage_bps,
            })),
            Some("ClosePosition") => Ok(TradeCommand::Close(ClosePositionCmd {
                user_id: self.user_id,
                order_id: self.order_id,
            })),
            other => {
                tracing::warn!(command = ?other, "unknown trade command");
                Err(Reply::err(
                    ErrorKind::MissingParameters,
                    "unknown or missing command",
                ))
            }
        }
    }
}

/// Parse a command frame. `None` means the payload was not JSON at all (the
/// reply address is unknowable, so the frame is logged and dropped). `Err`
/// inside means the frame was readable but not a command; the caller still
/// gets the salvaged `replyTo` so the failure can be answered.
fn parse_command_frame<F>(payload: &str) -> Option<(Result<F, Reply>, Option<String>)>
where
    F: for<'de> Deserialize<'de>,
{
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable command frame");
            return None;
        }
    };
    let reply_to = value
        .get("replyTo")
        .and_then(|v| v.as_str())
        .map(String::from);
    match serde_json::from_value::<F>(value) {
        Ok(frame) => Some((Ok(frame), reply_to)),
        Err(err) => {
            tracing::warn!(error = %err, "malformed command frame");
            Some((
                Err(Reply::err(
                    ErrorKind::MissingParameters,
                    "malformed command frame",
                )),
                reply_to,
            ))
        }
    }
}

pub fn parse_wallet_frame(payload: &str) -> Option<(Result<WalletCommand, Reply>, Option<String>)> {
    let (frame, reply_to) = parse_command_frame::<WalletFrame>(payload)?;
    Some((frame.and_then(|f| f.into_command()), reply_to))
}

pub fn parse_trade_frame(payload: &str) -> Option<(Result<TradeCommand, Reply>, Option<String>)> {
    let (frame, reply_to) = parse_command_frame::<TradeFrame>(payload)?;
    Some((frame.and_then(|f| f.into_command()), reply_to))
}

// 10.2: the event vocabulary of the engine task. a command travels with its
// reply sink; a tick travels alone.

pub enum EngineEvent {
    PriceBatch(Vec<PriceQuote>),
    Wallet(WalletCommand, Option<ReplyHandle>),
    Trade(TradeCommand, Option<ReplyHandle>),
    TakeSnapshot,
    Shutdown,
}

/// Cloneable submission side of the engine queue.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineEvent>,
}

impl EngineHandle {
    pub async fn send(&self, event: EngineEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    pub async fn submit_prices(&self, quotes: Vec<PriceQuote>) -> bool {
        self.send(EngineEvent::PriceBatch(quotes)).await
    }

    /// Submit a wallet command and wait for its reply.
    pub async fn wallet(&self, cmd: WalletCommand) -> Reply {
        let (tx, rx) = oneshot::channel();
        let sent = self.send(EngineEvent::Wallet(cmd, Some(Box::new(tx)))).await;
        await_reply(sent, rx).await
    }

    /// Submit a trade command and wait for its reply.
    pub async fn trade(&self, cmd: TradeCommand) -> Reply {
        let (tx, rx) = oneshot::channel();
        let sent = self.send(EngineEvent::Trade(cmd, Some(Box::new(tx)))).await;
        await_reply(sent, rx).await
    }

    pub async fn take_snapshot(&self) -> bool {
        self.send(EngineEvent::TakeSnapshot).await
    }

    /// Ask the engine task to stop. It finishes the queue entry in flight,
    /// takes a final snapshot and exits.
    pub async fn shutdown(&self) -> bool {
        self.send(EngineEvent::Shutdown).await
    }
}

async fn await_reply(sent: bool, rx: oneshot::Receiver<Reply>) -> Reply {
    if !sent {
        return Reply::err(ErrorKind::Internal, "engine unavailable");
    }
    rx.await
        .unwrap_or_else(|_| Reply::err(ErrorKind::Internal, "engine dropped the reply"))
}

// 10.3: the worker. restore happens inside the task but before the first
// recv, so events queued during boot wait in the channel rather than racing
// the restore.

pub fn spawn<S>(
    config: EngineConfig,
    mut store: S,
) -> (
    EngineHandle,
    JoinHandle<()>,
    mpsc::UnboundedReceiver<StoreEvent>,
)
where
    S: SnapshotStore + 'static,
{
    let snapshot_interval = config.snapshot_interval;
    let (tx, mut rx) = mpsc::channel(config.channel_capacity);
    let (mut engine, store_rx) = Engine::new(config);

    let worker = tokio::spawn(async move {
        match store.load_latest() {
            Ok(Some(snapshot)) => {
                if let Err(err) = engine.restore(snapshot) {
                    tracing::error!(error = %err, "snapshot restore failed, starting empty");
                }
            }
            Ok(None) => tracing::info!("no snapshot found, starting empty"),
            Err(err) => tracing::warn!(error = %err, "snapshot load failed, starting empty"),
        }

        let mut ticker = tokio::time::interval(snapshot_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // an interval fires immediately; swallow that one
        ticker.tick().await;

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(EngineEvent::PriceBatch(quotes)) => {
                        let outcome = engine.apply_price_batch(quotes);
                        if !outcome.liquidated.is_empty() {
                            tracing::info!(liquidated = outcome.liquidated.len(), scanned = outcome.scanned, "forced closes");
                        }
                    }
                    Some(EngineEvent::Wallet(cmd, reply_to)) => {
                        let reply = engine.handle_wallet(cmd);
                        deliver(reply_to, reply);
                    }
                    Some(EngineEvent::Trade(cmd, reply_to)) => {
                        let reply = engine.handle_trade(cmd);
                        deliver(reply_to, reply);
                    }
                    Some(EngineEvent::TakeSnapshot) => {
                        engine.save_snapshot_to(&mut store);
                    }
                    Some(EngineEvent::Shutdown) | None => {
                        engine.save_snapshot_to(&mut store);
                        tracing::info!("engine stopped");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    engine.save_snapshot_to(&mut store);
                }
            }
        }
    });

    (EngineHandle { tx }, worker, store_rx)
}

fn deliver(reply_to: Option<ReplyHandle>, reply: Reply) {
    if let Some(sink) = reply_to {
        sink.send(reply);
    }
}
