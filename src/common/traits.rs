//! Trait definitions for broker gateways

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::errors::Result;
use super::types::{
    AggregatePositionInfo, Bar, CloseReport, OrderConfirmation, PriceQuote, Side, Timeframe,
};

/// Broker capability consumed by the strategy and the driver
///
/// The gateway is the sole source of truth for positions. Implementations
/// are used by one driver at a time and may keep session state, so a handle
/// must not be shared between concurrently running drivers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Open the broker session (initialize, login, prepare the instrument)
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    /// Close the broker session
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    /// Aggregate over the open positions of one side
    async fn aggregate_position_info(
        &self,
        instrument: &str,
        side: Side,
    ) -> Result<AggregatePositionInfo>;

    /// Volume-weighted average entry price of one side
    ///
    /// Returns `None` when the side has no open volume.
    async fn break_even_price(&self, instrument: &str, side: Side) -> Result<Option<Decimal>>;

    /// Current bid/ask
    async fn price_quote(&self, instrument: &str) -> Result<PriceQuote>;

    /// Open a market position
    ///
    /// # Arguments
    /// * `instrument` - Symbol to trade
    /// * `side` - Direction of the new position
    /// * `lots` - Volume in lots
    async fn open_position(
        &self,
        instrument: &str,
        side: Side,
        lots: Decimal,
    ) -> Result<OrderConfirmation>;

    /// Close every open position on one side
    ///
    /// Individual close failures are the gateway's concern and are reported
    /// through [`CloseReport::failed`].
    async fn close_all_positions(&self, instrument: &str, side: Side) -> Result<CloseReport>;

    /// Latest bar for the sampling interval
    async fn latest_bar(&self, instrument: &str, timeframe: Timeframe) -> Result<Bar>;

    /// Name of the gateway implementation
    fn gateway_name(&self) -> &'static str;
}
