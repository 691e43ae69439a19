//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::common::types::Timeframe;

const REDACTED: &str = "<redacted>";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// MetaTrader 5 bridge configuration
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Martingale strategy parameters
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// MetaTrader 5 bridge configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Base URL of the MT5 bridge
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    /// Account number
    #[serde(default)]
    pub login: Option<u64>,
    /// Account password
    #[serde(default)]
    pub password: Option<String>,
    /// Broker trade server
    #[serde(default)]
    pub server: Option<String>,
    /// Path to the terminal executable, passed to initialize
    #[serde(default)]
    pub terminal_path: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum price deviation in points for market orders
    #[serde(default = "default_deviation")]
    pub deviation: u32,
    /// Magic number stamped on every order
    #[serde(default = "default_magic")]
    pub magic: u64,
    /// Order comment
    #[serde(default = "default_comment")]
    pub comment: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            login: None,
            password: None,
            server: None,
            terminal_path: None,
            request_timeout_seconds: default_request_timeout(),
            deviation: default_deviation(),
            magic: default_magic(),
            comment: default_comment(),
        }
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("bridge_url", &self.bridge_url)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("server", &self.server)
            .field("terminal_path", &self.terminal_path)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("deviation", &self.deviation)
            .field("magic", &self.magic)
            .field("comment", &self.comment)
            .finish()
    }
}

impl BrokerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_bridge_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_deviation() -> u32 {
    10
}

fn default_magic() -> u64 {
    123456
}

fn default_comment() -> String {
    "martingale_bot".to_string()
}

/// Martingale strategy parameters as written in the config file
///
/// Distances are absolute price units of the instrument, so they must be
/// re-derived when switching to an instrument with a different quote scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Instrument symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Size of the first position of a sequence
    #[serde(default = "default_start_lot")]
    pub start_lot: Decimal,
    /// Exponent applied to the open position count
    #[serde(default = "default_lot_multiplier")]
    pub lot_multiplier: Decimal,
    /// Distance above (buy) or below (sell) break-even that closes a side
    #[serde(default = "default_profit_margin")]
    pub profit_margin: Decimal,
    /// Adverse distance from the extreme entry that adds a position
    #[serde(default = "default_threshold_distance")]
    pub threshold_distance: Decimal,
    /// Number of bars between close evaluations
    #[serde(default = "default_close_check_period")]
    pub close_check_period: u32,
    /// Bar sampling interval
    #[serde(default)]
    pub timeframe: Timeframe,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            start_lot: default_start_lot(),
            lot_multiplier: default_lot_multiplier(),
            profit_margin: default_profit_margin(),
            threshold_distance: default_threshold_distance(),
            close_check_period: default_close_check_period(),
            timeframe: Timeframe::default(),
        }
    }
}

fn default_symbol() -> String {
    "XAUUSD".to_string()
}

fn default_start_lot() -> Decimal {
    dec!(0.01)
}

fn default_lot_multiplier() -> Decimal {
    dec!(1.25)
}

fn default_profit_margin() -> Decimal {
    dec!(25)
}

fn default_threshold_distance() -> Decimal {
    dec!(25)
}

fn default_close_check_period() -> u32 {
    5
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
    /// Delay between polls while the current bar is unchanged
    #[serde(default = "default_bar_poll_interval")]
    pub bar_poll_interval_seconds: u64,
    /// Delay before retrying a failed bar fetch
    #[serde(default = "default_bar_retry_delay")]
    pub bar_retry_delay_seconds: u64,
    /// Cooldown after a failed processing cycle
    #[serde(default = "default_error_cooldown")]
    pub error_cooldown_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            bar_poll_interval_seconds: default_bar_poll_interval(),
            bar_retry_delay_seconds: default_bar_retry_delay(),
            error_cooldown_seconds: default_error_cooldown(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bar_poll_interval() -> u64 {
    5
}

fn default_bar_retry_delay() -> u64 {
    5
}

fn default_error_cooldown() -> u64 {
    60
}

/// Login credentials for the broker account
#[derive(Clone)]
pub struct AccountCredentials {
    pub login: u64,
    pub password: String,
    pub server: String,
}

impl AccountCredentials {
    pub fn new(login: u64, password: String, server: String) -> Self {
        Self {
            login,
            password,
            server,
        }
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("login", &self.login)
            .field("password", &REDACTED)
            .field("server", &self.server)
            .finish()
    }
}
