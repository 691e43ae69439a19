//! Unified types shared by the gateway, the strategy and the driver

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Both sides in evaluation order
    pub const ALL: [Side; 2] = [Side::Buy, Side::Sell];

    /// +1 for buy, -1 for sell.
    ///
    /// Every mirrored comparison in the strategy is written once in terms of
    /// this sign: a positive signed move is in the position's favour.
    pub fn sign(self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    /// The side of the deal that closes a position of this side
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Price at which a new position on this side would fill
    pub fn entry_price(self, quote: &PriceQuote) -> Decimal {
        match self {
            Side::Buy => quote.ask,
            Side::Sell => quote.bid,
        }
    }

    /// Price at which a position on this side would be closed
    pub fn exit_price(self, quote: &PriceQuote) -> Decimal {
        self.opposite().entry_price(quote)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Current bid/ask for an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub bid: Decimal,
    pub ask: Decimal,
}

impl PriceQuote {
    pub fn new(bid: Decimal, ask: Decimal) -> Self {
        Self { bid, ask }
    }

    /// Calculate the spread
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

/// Aggregate view over the open positions of one side
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregatePositionInfo {
    /// Sum of position volumes in lots
    pub total_lots: Decimal,
    /// Sum of volume x contract size x current side price
    pub total_value: Decimal,
    /// Number of open positions
    pub position_count: usize,
    /// Lowest entry for buys, highest entry for sells
    pub extreme_entry_price: Option<Decimal>,
    /// Unrealized profit reported by the broker
    #[serde(default)]
    pub floating_profit: Decimal,
}

impl AggregatePositionInfo {
    /// Aggregate for a side with no open positions
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.position_count == 0
    }
}

/// A single open position as reported by the broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub ticket: u64,
    pub side: Side,
    pub volume: Decimal,
    pub price_open: Decimal,
    /// Unrealized profit in account currency
    #[serde(default)]
    pub profit: Decimal,
}

/// Sampling interval for bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Timeframe {
    #[default]
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Length of one bar in seconds
    pub fn as_seconds(self) -> i64 {
        match self {
            Timeframe::M1 => 60,
            Timeframe::M5 => 300,
            Timeframe::M15 => 900,
            Timeframe::M30 => 1_800,
            Timeframe::H1 => 3_600,
            Timeframe::H4 => 14_400,
            Timeframe::D1 => 86_400,
        }
    }

    /// Opening time of the bar containing `at`
    pub fn bar_open(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let secs = self.as_seconds();
        let floored = at.timestamp().div_euclid(secs) * secs;
        DateTime::from_timestamp(floored, 0).unwrap_or(at)
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        };
        write!(f, "{}", s)
    }
}

/// Latest bar of an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Opening time of the bar
    pub time: DateTime<Utc>,
}

impl Bar {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

/// Broker acknowledgement of a filled open order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub ticket: u64,
    pub side: Side,
    pub volume: Decimal,
    pub price: Decimal,
}

/// Outcome of closing every position on one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReport {
    pub side: Side,
    /// Positions closed successfully
    pub closed: usize,
    /// Positions whose close order failed
    pub failed: usize,
    /// Profit realized by the closed positions
    pub realized_profit: Decimal,
}

impl CloseReport {
    pub fn empty(side: Side) -> Self {
        Self {
            side,
            closed: 0,
            failed: 0,
            realized_profit: Decimal::ZERO,
        }
    }
}
