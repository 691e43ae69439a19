//! MT5 bridge message types
//!
//! Field names follow the MetaTrader 5 terminal API the bridge exposes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{OpenPosition, Side};

/// `TRADE_RETCODE_DONE`
pub const TRADE_RETCODE_DONE: u32 = 10009;

/// `ORDER_TYPE_BUY` / `POSITION_TYPE_BUY`
pub const ORDER_TYPE_BUY: u8 = 0;
/// `ORDER_TYPE_SELL` / `POSITION_TYPE_SELL`
pub const ORDER_TYPE_SELL: u8 = 1;

/// `TRADE_ACTION_DEAL`
pub const TRADE_ACTION_DEAL: u8 = 1;
/// `ORDER_TIME_GTC`
pub const ORDER_TIME_GTC: u8 = 0;
/// `ORDER_FILLING_IOC`
pub const ORDER_FILLING_IOC: u8 = 1;

pub fn order_type(side: Side) -> u8 {
    match side {
        Side::Buy => ORDER_TYPE_BUY,
        Side::Sell => ORDER_TYPE_SELL,
    }
}

/// Generic acknowledgement for session calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub ok: bool,
    /// Last terminal error when `ok` is false
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /initialize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: u64,
    pub password: String,
    pub server: String,
}

/// Body of `POST /symbols/{symbol}/select`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSelectRequest {
    pub enable: bool,
}

/// Response of `GET /symbols/{symbol}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfoResponse {
    pub name: String,
    pub visible: bool,
    pub trade_contract_size: Decimal,
}

/// Response of `GET /ticks/{symbol}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickResponse {
    pub bid: Decimal,
    pub ask: Decimal,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
}

/// One entry of `GET /positions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecord {
    pub ticket: u64,
    pub symbol: String,
    /// 0 = buy, 1 = sell
    #[serde(rename = "type")]
    pub position_type: u8,
    pub volume: Decimal,
    pub price_open: Decimal,
    #[serde(default)]
    pub profit: Decimal,
}

impl PositionRecord {
    pub fn side(&self) -> Option<Side> {
        match self.position_type {
            ORDER_TYPE_BUY => Some(Side::Buy),
            ORDER_TYPE_SELL => Some(Side::Sell),
            _ => None,
        }
    }

    /// Convert to the shared type; `None` for unknown position types
    pub fn to_open_position(&self) -> Option<OpenPosition> {
        Some(OpenPosition {
            ticket: self.ticket,
            side: self.side()?,
            volume: self.volume,
            price_open: self.price_open,
            profit: self.profit,
        })
    }
}

/// One entry of `GET /rates/{symbol}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRecord {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub tick_volume: u64,
}

/// Body of `POST /orders`, an MT5 trade request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRequest {
    pub action: u8,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    #[serde(rename = "type")]
    pub order_type: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Ticket of the position being closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
    pub type_time: u8,
    pub type_filling: u8,
}

/// Response of `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub retcode: u32,
    #[serde(default)]
    pub order: u64,
    #[serde(default)]
    pub deal: u64,
    #[serde(default)]
    pub volume: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub comment: String,
}

impl TradeResult {
    pub fn is_done(&self) -> bool {
        self.retcode == TRADE_RETCODE_DONE
    }
}
