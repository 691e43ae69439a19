//! Common test utilities and fixtures

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use martingale_bot::{
    DriverSettings, ManualClock, MartingaleStrategy, PaperGateway, PollingDriver,
    StrategyParameters,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

pub const SYMBOL: &str = "XAUUSD";

/// Default XAUUSD parameters with a custom close cadence
pub fn gold_params(close_check_period: u32) -> StrategyParameters {
    StrategyParameters::new(SYMBOL, dec!(0.01), dec!(1.25), dec!(25), dec!(25), close_check_period)
        .expect("valid parameters")
}

pub fn gold_strategy() -> MartingaleStrategy {
    MartingaleStrategy::new(gold_params(5))
}

/// Paper account with a gold-sized contract and a quote
pub fn paper_gateway(bid: Decimal, ask: Decimal) -> Arc<PaperGateway> {
    let gateway = Arc::new(PaperGateway::new(SYMBOL, dec!(100)));
    gateway.set_quote(bid, ask);
    gateway
}

pub fn minute(n: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200 + n * 60, 0).expect("valid timestamp")
}

pub fn paper_driver(
    gateway: Arc<PaperGateway>,
    close_check_period: u32,
) -> PollingDriver<PaperGateway, ManualClock> {
    PollingDriver::new(
        gateway,
        MartingaleStrategy::new(gold_params(close_check_period)),
        ManualClock::new(minute(0)),
        DriverSettings::default(),
    )
}

/// Sample bridge responses
pub mod bridge_responses {
    pub const SYMBOL_INFO: &str = r#"{
        "name": "XAUUSD",
        "visible": true,
        "trade_contract_size": 100.0
    }"#;

    pub const TICK: &str = r#"{
        "bid": 1873.6,
        "ask": 1874.0,
        "time": 1704067260
    }"#;

    pub const POSITIONS: &str = r#"[
        {"ticket": 501, "symbol": "XAUUSD", "type": 0, "volume": 0.01, "price_open": 1900.0, "profit": -26.0},
        {"ticket": 502, "symbol": "XAUUSD", "type": 0, "volume": 0.01, "price_open": 1880.0, "profit": -6.0},
        {"ticket": 503, "symbol": "XAUUSD", "type": 1, "volume": 0.01, "price_open": 1890.0, "profit": 16.0}
    ]"#;

    pub const RATES: &str = r#"[
        {"time": 1704067200, "open": 1875.0, "high": 1876.2, "low": 1873.1, "close": 1874.0, "tick_volume": 310},
        {"time": 1704067260, "open": 1874.0, "high": 1874.5, "low": 1873.4, "close": 1873.8, "tick_volume": 95}
    ]"#;

    pub const ORDER_DONE: &str = r#"{
        "retcode": 10009,
        "order": 9001,
        "deal": 7001,
        "volume": 0.01,
        "price": 1874.0,
        "comment": "Request executed"
    }"#;

    pub const ORDER_NO_MONEY: &str = r#"{
        "retcode": 10019,
        "order": 0,
        "deal": 0,
        "volume": 0.0,
        "price": 0.0,
        "comment": "No money"
    }"#;

    pub const OK: &str = r#"{"ok": true}"#;
}
