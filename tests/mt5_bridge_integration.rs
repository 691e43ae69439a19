//! Integration tests for the MT5 bridge gateway
//!
//! The bridge is replaced by a local wiremock server, so these run offline:
//! ```
//! cargo test --test mt5_bridge_integration
//! ```

mod common;

use common::bridge_responses::*;
use martingale_bot::config::BrokerConfig;
use martingale_bot::{BotError, Gateway, Mt5Gateway, Side, Timeframe};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SYMBOL: &str = "XAUUSD";

fn json_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/json")
}

fn broker_config(server: &MockServer) -> BrokerConfig {
    BrokerConfig {
        bridge_url: server.uri(),
        login: Some(51234567),
        password: Some("secret".into()),
        server: Some("Broker-Demo".into()),
        ..BrokerConfig::default()
    }
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/initialize"))
        .respond_with(json_response(OK))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(json_response(OK))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/symbols/XAUUSD"))
        .respond_with(json_response(SYMBOL_INFO))
        .mount(server)
        .await;
}

async fn mount_tick(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ticks/XAUUSD"))
        .respond_with(json_response(TICK))
        .mount(server)
        .await;
}

/// Gateway that already went through initialize + login
async fn connected_gateway(server: &MockServer) -> Mt5Gateway {
    mount_session(server).await;
    let gateway = Mt5Gateway::new(broker_config(server))
        .expect("Failed to create gateway")
        .with_symbol(SYMBOL);
    gateway.connect().await.expect("connect failed");
    gateway
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_connect_logs_in_and_prepares_symbol() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/initialize"))
        .respond_with(json_response(OK))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_partial_json(json!({"login": 51234567, "server": "Broker-Demo"})))
        .respond_with(json_response(OK))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/symbols/XAUUSD"))
        .respond_with(json_response(
            r#"{"name": "XAUUSD", "visible": false, "trade_contract_size": 100.0}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/symbols/XAUUSD/select"))
        .and(body_partial_json(json!({"enable": true})))
        .respond_with(json_response(OK))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Mt5Gateway::new(broker_config(&server))
        .unwrap()
        .with_symbol(SYMBOL);
    gateway.connect().await.unwrap();

    assert!(gateway.is_connected());
}

#[tokio::test]
async fn test_failed_login_shuts_down_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/initialize"))
        .respond_with(json_response(OK))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(json_response(r#"{"ok": false, "message": "Invalid account"}"#))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/shutdown"))
        .respond_with(json_response(OK))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Mt5Gateway::new(broker_config(&server)).unwrap();
    let err = gateway.connect().await.unwrap_err();

    assert!(matches!(err, BotError::Authentication(_)), "got {:?}", err);
    assert!(!gateway.is_connected());
}

#[tokio::test]
async fn test_unknown_symbol_fails_connect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/initialize"))
        .respond_with(json_response(OK))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(json_response(OK))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/symbols/XAUUSDm"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let gateway = Mt5Gateway::new(broker_config(&server))
        .unwrap()
        .with_symbol("XAUUSDm");
    let err = gateway.connect().await.unwrap_err();
    assert!(matches!(err, BotError::InstrumentNotFound(_)));
}

// ============================================================================
// Market Data Tests
// ============================================================================

#[tokio::test]
async fn test_price_quote_from_tick() {
    let server = MockServer::start().await;
    mount_tick(&server).await;
    let gateway = connected_gateway(&server).await;

    let quote = gateway.price_quote(SYMBOL).await.unwrap();
    assert_eq!(quote.bid, dec!(1873.6));
    assert_eq!(quote.ask, dec!(1874));
}

#[tokio::test]
async fn test_missing_tick_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ticks/XAUUSD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let err = gateway.price_quote(SYMBOL).await.unwrap_err();
    assert!(err.is_transient(), "got {:?}", err);
}

#[tokio::test]
async fn test_latest_bar_is_newest_rate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rates/XAUUSD"))
        .and(query_param("timeframe", "M1"))
        .and(query_param("start", "0"))
        .and(query_param("count", "2"))
        .respond_with(json_response(RATES))
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let bar = gateway.latest_bar(SYMBOL, Timeframe::M1).await.unwrap();
    assert_eq!(bar.time.timestamp(), 1_704_067_260);
}

#[tokio::test]
async fn test_short_rate_history_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rates/XAUUSD"))
        .respond_with(json_response(
            r#"[{"time": 1704067260, "open": 1874.0, "high": 1874.5, "low": 1873.4, "close": 1873.8}]"#,
        ))
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let err = gateway.latest_bar(SYMBOL, Timeframe::M1).await.unwrap_err();
    assert!(err.is_transient());
}

// ============================================================================
// Position Tests
// ============================================================================

#[tokio::test]
async fn test_aggregate_only_counts_requested_side() {
    let server = MockServer::start().await;
    mount_tick(&server).await;
    Mock::given(method("GET"))
        .and(path("/positions"))
        .and(query_param("symbol", SYMBOL))
        .respond_with(json_response(POSITIONS))
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let buys = gateway.aggregate_position_info(SYMBOL, Side::Buy).await.unwrap();
    assert_eq!(buys.position_count, 2);
    assert_eq!(buys.total_lots, dec!(0.02));
    assert_eq!(buys.extreme_entry_price, Some(dec!(1880)));

    let sells = gateway.aggregate_position_info(SYMBOL, Side::Sell).await.unwrap();
    assert_eq!(sells.position_count, 1);
    assert_eq!(sells.extreme_entry_price, Some(dec!(1890)));

    let be = gateway.break_even_price(SYMBOL, Side::Buy).await.unwrap();
    assert_eq!(be, Some(dec!(1890)));
}

#[tokio::test]
async fn test_no_positions_means_flat() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/positions"))
        .respond_with(json_response("[]"))
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let info = gateway.aggregate_position_info(SYMBOL, Side::Sell).await.unwrap();
    assert!(info.is_flat());
    assert_eq!(gateway.break_even_price(SYMBOL, Side::Sell).await.unwrap(), None);
}

// ============================================================================
// Order Tests
// ============================================================================

#[tokio::test]
async fn test_open_position_sends_market_deal() {
    let server = MockServer::start().await;
    mount_tick(&server).await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(json!({
            "action": 1,
            "symbol": "XAUUSD",
            "type": 0,
            "volume": 0.01,
            "price": 1874.0,
            "magic": 123456,
            "type_filling": 1
        })))
        .respond_with(json_response(ORDER_DONE))
        .expect(1)
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let confirmation = gateway
        .open_position(SYMBOL, Side::Buy, dec!(0.01))
        .await
        .unwrap();
    assert_eq!(confirmation.ticket, 9001);
    assert_eq!(confirmation.side, Side::Buy);
    assert_eq!(confirmation.price, dec!(1874));
}

#[tokio::test]
async fn test_rejected_order_carries_retcode() {
    let server = MockServer::start().await;
    mount_tick(&server).await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(json_response(ORDER_NO_MONEY))
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let err = gateway
        .open_position(SYMBOL, Side::Sell, dec!(0.02))
        .await
        .unwrap_err();
    match err {
        BotError::OrderRejected { retcode, message } => {
            assert_eq!(retcode, 10019);
            assert_eq!(message, "No money");
        }
        other => panic!("expected OrderRejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_close_all_continues_past_failures() {
    let server = MockServer::start().await;
    mount_tick(&server).await;
    Mock::given(method("GET"))
        .and(path("/positions"))
        .respond_with(json_response(POSITIONS))
        .mount(&server)
        .await;
    // closing a buy is a sell deal against the ticket
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(json!({"position": 501, "type": 1, "price": 1873.6})))
        .respond_with(json_response(ORDER_NO_MONEY))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(json!({"position": 502, "type": 1})))
        .respond_with(json_response(ORDER_DONE))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(json!({"position": 503})))
        .respond_with(json_response(ORDER_DONE))
        .expect(0)
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let report = gateway.close_all_positions(SYMBOL, Side::Buy).await.unwrap();
    assert_eq!(report.side, Side::Buy);
    assert_eq!(report.closed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.realized_profit, dec!(-6));
}

#[tokio::test]
async fn test_disconnect_shuts_down_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/shutdown"))
        .respond_with(json_response(OK))
        .expect(1)
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    gateway.disconnect().await.unwrap();
    gateway.disconnect().await.unwrap();
    assert!(!gateway.is_connected());

    let err = gateway.price_quote(SYMBOL).await.unwrap_err();
    assert!(matches!(err, BotError::NotConnected));
}

#[tokio::test]
async fn test_symbol_with_reserved_characters_is_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ticks/BRENT%23"))
        .respond_with(json_response(TICK))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/positions"))
        .and(query_param("symbol", "BRENT#"))
        .respond_with(json_response("[]"))
        .expect(1)
        .mount(&server)
        .await;
    let gateway = connected_gateway(&server).await;

    let quote = gateway.price_quote("BRENT#").await.unwrap();
    assert_eq!(quote.ask, dec!(1874));
    assert_eq!(gateway.break_even_price("BRENT#", Side::Buy).await.unwrap(), None);
}
