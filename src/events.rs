// 7.0: everything that crosses the engine boundary on the way out. store
// events feed the (external) persistence writer, replies answer the command
// that asked. both are fire-and-forget from the engine's point of view.

use crate::position::Position;
use crate::types::{minor_units, OrderId};
use serde::{Deserialize, Serialize};

// 7.1: one event per ledger mutation, keyed by order id so the downstream
// writer can apply them idempotently. create carries the whole position;
// update carries only the terminal fields of a close or liquidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StoreEvent {
    CreatePosition(Position),
    UpdatePosition(PositionUpdate),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    pub order_id: OrderId,
    #[serde(with = "minor_units")]
    pub close_price: i64,
    pub price_decimals: u32,
    /// Signed realized pnl in USDC minor units. A liquidation reports the
    /// full margin as loss regardless of how far past the threshold the
    /// price landed.
    #[serde(with = "minor_units")]
    pub pnl: i64,
    pub liquidated: bool,
}

// 7.2: command replies. flat shape: success plus data, or success=false
// plus a stable kind string and a human message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Stable machine-readable failure classes. Serialized by variant name, so
/// renaming a variant is a wire-protocol change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingParameters,
    InvalidAsset,
    InvalidSide,
    InvalidMargin,
    InvalidLeverage,
    InvalidSlippage,
    PriceUnavailable,
    InsufficientMargin,
    DuplicateOrderId,
    PositionNotFound,
    Unauthorized,
    AlreadyClosed,
    DivisionByZero,
    Internal,
}

impl Reply {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_kind: None,
            message: None,
        }
    }

    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error_kind: Some(kind),
            message: Some(message.into()),
        }
    }
}

// 7.3: where a reply goes is the transport's business. the engine holds a
// boxed sink per in-flight command and consumes it on send; a command gets
// at most one reply.
pub trait ReplySink: Send {
    fn send(self: Box<Self>, reply: Reply);
}

pub type ReplyHandle = Box<dyn ReplySink>;

// a oneshot is the natural sink for request/response callers. a dropped
// receiver just means nobody is waiting anymore.
impl ReplySink for tokio::sync::oneshot::Sender<Reply> {
    fn send(self: Box<Self>, reply: Reply) {
        let _ = (*self).send(reply);
    }
}
