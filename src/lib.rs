//! MartingaleBot Library
//!
//! Bar-driven martingale position management for a single instrument on a
//! margin account, reached through a MetaTrader 5 bridge or a paper account.

pub mod common;
pub mod config;
pub mod driver;
pub mod gateway;
pub mod strategy;

// Re-export commonly used types
pub use common::errors::{BotError, Result};
pub use common::traits::Gateway;
pub use common::types::{
    AggregatePositionInfo, Bar, CloseReport, OpenPosition, OrderConfirmation, PriceQuote, Side,
    Timeframe,
};
pub use config::types::AppConfig;
pub use driver::{Clock, DriverSettings, DriverState, ManualClock, PollingDriver, TokioClock};
pub use gateway::{Mt5Gateway, Mt5RestClient, PaperGateway};

// Strategy types
pub use strategy::{
    CloseDecision, CloseOutcome, MartingaleStrategy, OpenDecision, OpenOutcome, StrategyParameters,
};
