//! Leveraged Trading Simulator demo.
//!
//! Boots the engine actor, replays a trading session over the wire-frame
//! ingress (wallet bootstrap, leveraged longs, a take-profit close, a crash
//! that liquidates), then restarts from the snapshot to show the book
//! survives a process death.

use tradesim_core::ingress::{parse_price_frame, parse_trade_frame, parse_wallet_frame};
use tradesim_core::{
    spawn, EngineConfig, EngineHandle, ErrorKind, MemorySnapshotStore, Reply, StoreEvent,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("Leveraged Trading Simulator");
    println!("Single-Writer Engine, Fixed-Point Money, Snapshot Recovery\n");

    let store = MemorySnapshotStore::new();
    let (handle, worker, mut store_rx) = spawn(EngineConfig::default(), store.clone());

    // mirror what the external persistence worker would see
    let sink = tokio::spawn(async move {
        let mut events = 0usize;
        while let Some(event) = store_rx.recv().await {
            events += 1;
            match event {
                StoreEvent::CreatePosition(p) => {
                    println!("    [store] create {} ({} {})", p.order_id, p.side, p.asset)
                }
                StoreEvent::UpdatePosition(u) => println!(
                    "    [store] update {} pnl {} liquidated {}",
                    u.order_id,
                    fmt_usdc(u.pnl),
                    u.liquidated
                ),
            }
        }
        events
    });

    scenario_1_wallet_bootstrap(&handle).await;
    let order_id = scenario_2_open_btc_long(&handle).await;
    scenario_3_take_profit(&handle, &order_id).await;
    scenario_4_crash_and_liquidation(&handle).await;

    handle.shutdown().await;
    worker.await.ok();
    let events = sink.await.unwrap_or(0);
    println!("  {events} store events emitted\n");

    scenario_5_restart_from_snapshot(store, &order_id).await;

    println!("\nAll scenarios completed.");
}

/// First touch seeds the wallet with the starting grant.
async fn scenario_1_wallet_bootstrap(handle: &EngineHandle) {
    println!("Scenario 1: Wallet Bootstrap\n");

    let (cmd, _) = parse_wallet_frame(r#"{"userId":"alice","command":"InitWallet"}"#).unwrap();
    let reply = handle.wallet(cmd.unwrap()).await;
    println!("  alice starts with {} USDC", fmt_usdc(usdc_of(&reply)));

    let (cmd, _) = parse_wallet_frame(r#"{"userId":"bob","command":"GetBalance"}"#).unwrap();
    let reply = handle.wallet(cmd.unwrap()).await;
    println!("  bob starts with {} USDC\n", fmt_usdc(usdc_of(&reply)));
}

/// Open a 5x BTC long at $500,000.
async fn scenario_2_open_btc_long(handle: &EngineHandle) -> String {
    println!("Scenario 2: Open a Leveraged Long\n");

    let quotes = parse_price_frame(
        r#"{"price_updates":[
            {"asset":"BTC","price":"5000000000","decimals":4},
            {"asset":"ETH","price":"50000","decimals":4}
        ]}"#,
    );
    handle.submit_prices(quotes).await;
    println!("  feed: BTC $500000.0000, ETH $5.0000");

    let (cmd, _) = parse_trade_frame(
        r#"{"userId":"alice","command":"OpenPosition","asset":"BTC","side":"long",
           "margin":100000,"leverage":5,"slippageBps":50}"#,
    )
    .unwrap();
    let reply = handle.trade(cmd.unwrap()).await;
    let data = reply.data.unwrap();
    let order_id = data["orderId"].as_str().unwrap().to_string();
    println!(
        "  alice longs BTC 5x with {} USDC margin",
        fmt_usdc(str_amount(&data["margin"]))
    );
    println!(
        "  entry {} / liquidation {}\n",
        fmt_price(str_amount(&data["entryPrice"])),
        fmt_price(str_amount(&data["liquidationPrice"]))
    );
    order_id
}

/// A 2% move in alice's favor, then close.
async fn scenario_3_take_profit(handle: &EngineHandle, order_id: &str) {
    println!("Scenario 3: Take Profit\n");

    handle
        .submit_prices(parse_price_frame(
            r#"{"price_updates":[{"asset":"BTC","price":"5100000000","decimals":4}]}"#,
        ))
        .await;
    println!("  BTC rises 2% to $510000.0000");

    let frame = format!(
        r#"{{"userId":"alice","command":"ClosePosition","orderId":"{order_id}"}}"#
    );
    let (cmd, _) = parse_trade_frame(&frame).unwrap();
    let reply = handle.trade(cmd.unwrap()).await;
    let data = reply.data.unwrap();
    println!(
        "  closed for pnl {} USDC, balance now {}\n",
        fmt_usdc(str_amount(&data["pnl"])),
        fmt_usdc(str_amount(&data["usdcBalance"]))
    );
}

/// A 10x long does not survive a 12% crash.
async fn scenario_4_crash_and_liquidation(handle: &EngineHandle) {
    println!("Scenario 4: Crash and Liquidation\n");

    let (cmd, _) = parse_trade_frame(
        r#"{"userId":"bob","command":"OpenPosition","asset":"ETH","side":"long",
           "margin":100000,"leverage":10,"slippageBps":50}"#,
    )
    .unwrap();
    let reply = handle.trade(cmd.unwrap()).await;
    let data = reply.data.unwrap();
    let order_id = data["orderId"].as_str().unwrap().to_string();
    println!(
        "  bob longs ETH 10x, liquidation at {}",
        fmt_price(str_amount(&data["liquidationPrice"]))
    );

    handle
        .submit_prices(parse_price_frame(
            r#"{"price_updates":[{"asset":"ETH","price":"44000","decimals":4}]}"#,
        ))
        .await;
    println!("  ETH crashes 12% to $4.4000");

    let frame = format!(
        r#"{{"userId":"bob","command":"ClosePosition","orderId":"{order_id}"}}"#
    );
    let (cmd, _) = parse_trade_frame(&frame).unwrap();
    let reply = handle.trade(cmd.unwrap()).await;
    println!(
        "  bob tries to close: {:?} (the sweep got there first)",
        reply.error_kind.unwrap_or(ErrorKind::Internal)
    );

    let (cmd, _) = parse_wallet_frame(r#"{"userId":"bob","command":"GetBalance"}"#).unwrap();
    let reply = handle.wallet(cmd.unwrap()).await;
    println!(
        "  bob's margin is gone, balance {} USDC\n",
        fmt_usdc(usdc_of(&reply))
    );
}

/// A fresh engine over the old store picks up where the last one stopped.
async fn scenario_5_restart_from_snapshot(store: MemorySnapshotStore, closed_order: &str) {
    println!("Scenario 5: Restart From Snapshot\n");

    let (handle, worker, _store_rx) = spawn(EngineConfig::default(), store);

    let (cmd, _) = parse_wallet_frame(r#"{"userId":"alice","command":"GetBalance"}"#).unwrap();
    let reply = handle.wallet(cmd.unwrap()).await;
    println!("  alice after restart: {} USDC", fmt_usdc(usdc_of(&reply)));

    // the closed position came back too
    let frame = format!(
        r#"{{"userId":"alice","command":"ClosePosition","orderId":"{closed_order}"}}"#
    );
    let (cmd, _) = parse_trade_frame(&frame).unwrap();
    let reply = handle.trade(cmd.unwrap()).await;
    println!(
        "  closing the old order again: {:?}",
        reply.error_kind.unwrap_or(ErrorKind::Internal)
    );

    handle.shutdown().await;
    worker.await.ok();
}

fn usdc_of(reply: &Reply) -> i64 {
    reply
        .data
        .as_ref()
        .map(|d| str_amount(&d["usdc"]["amount"]))
        .unwrap_or_default()
}

fn str_amount(value: &serde_json::Value) -> i64 {
    value.as_str().and_then(|s| s.parse().ok()).unwrap_or_default()
}

fn fmt_usdc(minor: i64) -> String {
    fmt_minor(minor, 2)
}

fn fmt_price(minor: i64) -> String {
    format!("${}", fmt_minor(minor, 4))
}

fn fmt_minor(amount: i64, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10_u64.pow(decimals);
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    format!(
        "{sign}{}.{:0width$}",
        magnitude / scale,
        magnitude % scale,
        width = decimals as usize
    )
}
