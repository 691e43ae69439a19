//! Gateway implementation backed by the MT5 bridge

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use super::messages::*;
use super::positions::{aggregate_side, break_even_price};
use super::rest::Mt5RestClient;
use crate::common::errors::{BotError, Result};
use crate::common::traits::Gateway;
use crate::common::types::{
    AggregatePositionInfo, Bar, CloseReport, OpenPosition, OrderConfirmation, PriceQuote, Side,
    Timeframe,
};
use crate::config::types::{AccountCredentials, BrokerConfig};

/// MetaTrader 5 account reached through the HTTP bridge
pub struct Mt5Gateway {
    /// REST API client
    rest_client: Mt5RestClient,
    /// Configuration
    config: BrokerConfig,
    /// Symbol prepared on connect
    symbol: Option<String>,
    /// Set once initialize + login succeeded
    connected: AtomicBool,
    /// Contract sizes by symbol, filled on first use
    contract_sizes: RwLock<HashMap<String, Decimal>>,
}

impl Mt5Gateway {
    /// Create a new gateway from configuration
    pub fn new(config: BrokerConfig) -> Result<Self> {
        let rest_client = Mt5RestClient::with_timeout(&config.bridge_url, config.request_timeout())?;
        Ok(Self {
            rest_client,
            config,
            symbol: None,
            connected: AtomicBool::new(false),
            contract_sizes: RwLock::new(HashMap::new()),
        })
    }

    /// Prepare `symbol` for trading during `connect`
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn credentials(&self) -> Result<AccountCredentials> {
        match (&self.config.login, &self.config.password, &self.config.server) {
            (Some(login), Some(password), Some(server)) => Ok(AccountCredentials::new(
                *login,
                password.clone(),
                server.clone(),
            )),
            _ => Err(BotError::Configuration(
                "broker login, password and server are required (MT5_NUMBER, MT5_PASSWORD, MT5_SERVER)"
                    .into(),
            )),
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(BotError::NotConnected)
        }
    }

    /// Make sure the symbol exists and is visible in Market Watch
    #[instrument(skip(self))]
    pub async fn ensure_symbol_ready(&self, symbol: &str) -> Result<()> {
        let info = self
            .rest_client
            .symbol_info(symbol)
            .await?
            .ok_or_else(|| BotError::InstrumentNotFound(format!("Symbol '{}' not found", symbol)))?;

        if !info.visible && !self.rest_client.symbol_select(symbol, true).await? {
            return Err(BotError::InstrumentNotFound(format!(
                "Symbol '{}' is not visible and could not be selected",
                symbol
            )));
        }

        self.remember_contract_size(symbol, info.trade_contract_size).await;
        Ok(())
    }

    async fn remember_contract_size(&self, symbol: &str, size: Decimal) {
        self.contract_sizes
            .write()
            .await
            .insert(symbol.to_string(), size);
    }

    async fn contract_size(&self, symbol: &str) -> Result<Decimal> {
        let cached = self.contract_sizes.read().await.get(symbol).copied();
        if let Some(size) = cached {
            return Ok(size);
        }

        let info = self
            .rest_client
            .symbol_info(symbol)
            .await?
            .ok_or_else(|| BotError::Transient("Failed to get symbol info".into()))?;
        self.remember_contract_size(symbol, info.trade_contract_size).await;
        Ok(info.trade_contract_size)
    }

    async fn open_positions(&self, symbol: &str) -> Result<Vec<OpenPosition>> {
        let records = self.rest_client.positions(symbol).await?;
        Ok(records
            .iter()
            .filter(|r| r.symbol == symbol)
            .filter_map(PositionRecord::to_open_position)
            .collect())
    }

    fn market_request(
        &self,
        symbol: &str,
        side: Side,
        volume: Decimal,
        price: Decimal,
        position: Option<u64>,
    ) -> TradeRequest {
        TradeRequest {
            action: TRADE_ACTION_DEAL,
            symbol: symbol.to_string(),
            volume,
            order_type: order_type(side),
            price,
            position,
            deviation: self.config.deviation,
            magic: self.config.magic,
            comment: self.config.comment.clone(),
            type_time: ORDER_TIME_GTC,
            type_filling: ORDER_FILLING_IOC,
        }
    }
}

#[async_trait]
impl Gateway for Mt5Gateway {
    #[instrument(skip(self))]
    async fn connect(&self) -> Result<()> {
        let credentials = self.credentials()?;

        self.rest_client
            .initialize(self.config.terminal_path.as_deref())
            .await?;
        info!("MT5 initialized");

        if let Err(e) = self.rest_client.login(&credentials).await {
            if let Err(shutdown_err) = self.rest_client.shutdown().await {
                warn!(error = %shutdown_err, "Shutdown after failed login also failed");
            }
            return Err(e);
        }
        info!(login = credentials.login, server = %credentials.server, "MT5 login successful");

        self.connected.store(true, Ordering::SeqCst);
        if let Some(symbol) = &self.symbol {
            self.ensure_symbol_ready(symbol).await?;
            info!(symbol = %symbol, "Symbol ready");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn disconnect(&self) -> Result<()> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.rest_client.shutdown().await?;
        info!("MT5 connection closed");
        Ok(())
    }

    async fn aggregate_position_info(
        &self,
        instrument: &str,
        side: Side,
    ) -> Result<AggregatePositionInfo> {
        self.ensure_connected()?;
        let positions = self.open_positions(instrument).await?;
        if !positions.iter().any(|p| p.side == side) {
            return Ok(AggregatePositionInfo::flat());
        }

        let tick = self.rest_client.tick(instrument).await?;
        let quote = PriceQuote::new(tick.bid, tick.ask);
        let contract_size = self.contract_size(instrument).await?;
        Ok(aggregate_side(&positions, side, &quote, contract_size))
    }

    async fn break_even_price(&self, instrument: &str, side: Side) -> Result<Option<Decimal>> {
        self.ensure_connected()?;
        let positions = self.open_positions(instrument).await?;
        Ok(break_even_price(&positions, side))
    }

    async fn price_quote(&self, instrument: &str) -> Result<PriceQuote> {
        self.ensure_connected()?;
        let tick = self.rest_client.tick(instrument).await?;
        Ok(PriceQuote::new(tick.bid, tick.ask))
    }

    #[instrument(skip(self))]
    async fn open_position(
        &self,
        instrument: &str,
        side: Side,
        lots: Decimal,
    ) -> Result<OrderConfirmation> {
        self.ensure_connected()?;
        let tick = self.rest_client.tick(instrument).await?;
        let price = side.entry_price(&PriceQuote::new(tick.bid, tick.ask));

        let request = self.market_request(instrument, side, lots, price, None);
        let result = self.rest_client.order_send(&request).await?;
        if !result.is_done() {
            return Err(BotError::OrderRejected {
                retcode: result.retcode,
                message: result.comment,
            });
        }

        info!(side = %side, lots = %lots, order = result.order, price = %result.price, "Order placed");
        Ok(OrderConfirmation {
            ticket: result.order,
            side,
            volume: if result.volume.is_zero() { lots } else { result.volume },
            price: if result.price.is_zero() { price } else { result.price },
        })
    }

    #[instrument(skip(self))]
    async fn close_all_positions(&self, instrument: &str, side: Side) -> Result<CloseReport> {
        self.ensure_connected()?;
        let mut report = CloseReport::empty(side);

        let targets: Vec<OpenPosition> = self
            .open_positions(instrument)
            .await?
            .into_iter()
            .filter(|p| p.side == side)
            .collect();

        if targets.is_empty() {
            info!(side = %side, "No {} positions to close for {}", side, instrument);
            return Ok(report);
        }

        for pos in targets {
            let outcome = async {
                let tick = self.rest_client.tick(instrument).await?;
                let price = side.exit_price(&PriceQuote::new(tick.bid, tick.ask));
                let request =
                    self.market_request(instrument, side.opposite(), pos.volume, price, Some(pos.ticket));
                self.rest_client.order_send(&request).await
            }
            .await;

            match outcome {
                Ok(result) if result.is_done() => {
                    info!(side = %side, ticket = pos.ticket, profit = %pos.profit, "Closed position");
                    report.closed += 1;
                    report.realized_profit += pos.profit;
                }
                Ok(result) => {
                    error!(
                        side = %side,
                        ticket = pos.ticket,
                        retcode = result.retcode,
                        comment = %result.comment,
                        "Failed to close position"
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    error!(side = %side, ticket = pos.ticket, error = %e, "Failed to close position");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn latest_bar(&self, instrument: &str, timeframe: Timeframe) -> Result<Bar> {
        self.ensure_connected()?;
        let rates = self
            .rest_client
            .rates_from_pos(instrument, timeframe, 0, 2)
            .await?;
        match rates.last() {
            Some(last) if rates.len() >= 2 => Ok(Bar::new(last.time)),
            _ => Err(BotError::Transient(format!(
                "Failed to get candles for {}",
                instrument
            ))),
        }
    }

    fn gateway_name(&self) -> &'static str {
        "MT5"
    }
}
