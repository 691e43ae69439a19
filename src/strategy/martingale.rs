use tracing::{info, instrument, warn};

use super::params::StrategyParameters;
use super::sizing::{decide_close, decide_open};
use super::types::{CloseDecision, CloseOutcome, OpenOutcome};
use crate::common::errors::Result;
use crate::common::traits::Gateway;
use crate::common::types::Side;

/// Martingale position manager for one instrument
///
/// Holds no position state of its own: every evaluation re-reads the gateway.
/// Gateway errors are returned unchanged and never retried here.
#[derive(Debug, Clone)]
pub struct MartingaleStrategy {
    params: StrategyParameters,
}

impl MartingaleStrategy {
    pub fn new(params: StrategyParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StrategyParameters {
        &self.params
    }

    /// Seed or scale the sequence on `side`, placing at most one order
    #[instrument(skip(self, gateway), fields(instrument = %self.params.instrument()))]
    pub async fn evaluate_open<G>(&self, gateway: &G, side: Side) -> Result<OpenOutcome>
    where
        G: Gateway + ?Sized,
    {
        let instrument = self.params.instrument();
        let info = gateway.aggregate_position_info(instrument, side).await?;

        let quote = if info.is_flat() {
            None
        } else {
            Some(gateway.price_quote(instrument).await?)
        };

        let decision = decide_open(&self.params, side, &info, quote.as_ref())?;

        let Some(lots) = decision.lots() else {
            info!(
                side = %side,
                positions = info.position_count,
                outcome = decision.outcome(),
                ?decision,
                "No new position"
            );
            return Ok(OpenOutcome {
                decision,
                confirmation: None,
            });
        };

        let confirmation = gateway.open_position(instrument, side, lots).await?;
        info!(
            side = %side,
            lots = %lots,
            positions = info.position_count,
            ticket = confirmation.ticket,
            fill_price = %confirmation.price,
            outcome = decision.outcome(),
            "Opened position"
        );

        Ok(OpenOutcome {
            decision,
            confirmation: Some(confirmation),
        })
    }

    /// Close every position on `side` once the profit target is passed
    #[instrument(skip(self, gateway), fields(instrument = %self.params.instrument()))]
    pub async fn evaluate_close<G>(&self, gateway: &G, side: Side) -> Result<CloseOutcome>
    where
        G: Gateway + ?Sized,
    {
        let instrument = self.params.instrument();
        let break_even = gateway.break_even_price(instrument, side).await?;

        if break_even.is_none() {
            info!(side = %side, outcome = "flat", "No open volume to close");
            return Ok(CloseOutcome {
                decision: CloseDecision::Flat { side },
                report: None,
            });
        }

        let quote = gateway.price_quote(instrument).await?;
        let decision = decide_close(&self.params, side, break_even, &quote);
        let distance = decision.break_even_distance().unwrap_or_default();

        if !decision.is_go() {
            info!(
                side = %side,
                break_even_distance = %distance,
                profit_margin = %self.params.profit_margin(),
                outcome = decision.outcome(),
                "Profit target not reached"
            );
            return Ok(CloseOutcome {
                decision,
                report: None,
            });
        }

        let report = gateway.close_all_positions(instrument, side).await?;
        if report.failed > 0 {
            warn!(
                side = %side,
                closed = report.closed,
                failed = report.failed,
                "Some positions could not be closed"
            );
        }
        info!(
            side = %side,
            break_even_distance = %distance,
            closed = report.closed,
            realized_profit = %report.realized_profit,
            outcome = decision.outcome(),
            "Closed all positions"
        );

        Ok(CloseOutcome {
            decision,
            report: Some(report),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::BotError;
    use crate::common::traits::MockGateway;
    use crate::common::types::{AggregatePositionInfo, CloseReport, OrderConfirmation, PriceQuote};
    use crate::strategy::types::OpenDecision;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn strategy() -> MartingaleStrategy {
        MartingaleStrategy::new(
            StrategyParameters::new("XAUUSD", dec!(0.01), dec!(1.25), dec!(25), dec!(25), 5).unwrap(),
        )
    }

    fn confirmation(side: Side, volume: rust_decimal::Decimal) -> OrderConfirmation {
        OrderConfirmation {
            ticket: 42,
            side,
            volume,
            price: dec!(1874),
        }
    }

    #[tokio::test]
    async fn test_flat_side_opens_start_lot_without_quote() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_aggregate_position_info()
            .with(eq("XAUUSD"), eq(Side::Sell))
            .times(1)
            .returning(|_, _| Ok(AggregatePositionInfo::flat()));
        gateway.expect_price_quote().never();
        gateway
            .expect_open_position()
            .with(eq("XAUUSD"), eq(Side::Sell), eq(dec!(0.01)))
            .times(1)
            .returning(|_, side, lots| Ok(confirmation(side, lots)));

        let outcome = strategy().evaluate_open(&gateway, Side::Sell).await.unwrap();
        assert_eq!(outcome.decision, OpenDecision::Seed { side: Side::Sell, lots: dec!(0.01) });
        assert!(outcome.confirmation.is_some());
    }

    #[tokio::test]
    async fn test_hold_places_no_order() {
        let mut gateway = MockGateway::new();
        gateway.expect_aggregate_position_info().returning(|_, _| {
            Ok(AggregatePositionInfo {
                total_lots: dec!(0.04),
                total_value: dec!(0),
                position_count: 3,
                extreme_entry_price: Some(dec!(1900)),
                floating_profit: dec!(0),
            })
        });
        gateway
            .expect_price_quote()
            .returning(|_| Ok(PriceQuote::new(dec!(1874.50), dec!(1875))));
        gateway.expect_open_position().never();

        let outcome = strategy().evaluate_open(&gateway, Side::Buy).await.unwrap();
        assert!(!outcome.decision.is_go());
        assert!(outcome.confirmation.is_none());
    }

    #[tokio::test]
    async fn test_price_below_trigger_scales_in() {
        let mut gateway = MockGateway::new();
        gateway.expect_aggregate_position_info().returning(|_, _| {
            Ok(AggregatePositionInfo {
                total_lots: dec!(0.04),
                total_value: dec!(0),
                position_count: 3,
                extreme_entry_price: Some(dec!(1900)),
                floating_profit: dec!(0),
            })
        });
        gateway
            .expect_price_quote()
            .returning(|_| Ok(PriceQuote::new(dec!(1874.50), dec!(1874.99))));
        gateway
            .expect_open_position()
            .with(eq("XAUUSD"), eq(Side::Buy), eq(dec!(0.04)))
            .times(1)
            .returning(|_, side, lots| Ok(confirmation(side, lots)));

        let outcome = strategy().evaluate_open(&gateway, Side::Buy).await.unwrap();
        assert_eq!(outcome.decision.side(), Side::Buy);
        assert_eq!(outcome.decision.lots(), Some(dec!(0.04)));
        assert_eq!(outcome.confirmation.unwrap().volume, dec!(0.04));
    }

    #[tokio::test]
    async fn test_rejected_order_propagates() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_aggregate_position_info()
            .returning(|_, _| Ok(AggregatePositionInfo::flat()));
        gateway.expect_open_position().times(1).returning(|_, _, _| {
            Err(BotError::OrderRejected {
                retcode: 10019,
                message: "No money".into(),
            })
        });

        let err = strategy().evaluate_open(&gateway, Side::Buy).await.unwrap_err();
        assert!(matches!(err, BotError::OrderRejected { retcode: 10019, .. }));
    }

    #[tokio::test]
    async fn test_close_without_break_even_is_noop() {
        let mut gateway = MockGateway::new();
        gateway.expect_break_even_price().returning(|_, _| Ok(None));
        gateway.expect_price_quote().never();
        gateway.expect_close_all_positions().never();

        let outcome = strategy().evaluate_close(&gateway, Side::Buy).await.unwrap();
        assert_eq!(outcome.decision, CloseDecision::Flat { side: Side::Buy });
    }

    #[tokio::test]
    async fn test_close_fires_once_past_target() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_break_even_price()
            .with(eq("XAUUSD"), eq(Side::Buy))
            .returning(|_, _| Ok(Some(dec!(1900))));
        gateway
            .expect_price_quote()
            .returning(|_| Ok(PriceQuote::new(dec!(1925.60), dec!(1926))));
        gateway
            .expect_close_all_positions()
            .with(eq("XAUUSD"), eq(Side::Buy))
            .times(1)
            .returning(|_, side| {
                Ok(CloseReport {
                    side,
                    closed: 2,
                    failed: 0,
                    realized_profit: dec!(51.20),
                })
            });

        let outcome = strategy().evaluate_close(&gateway, Side::Buy).await.unwrap();
        assert!(outcome.decision.is_go());
        assert_eq!(outcome.decision.side(), Side::Buy);
        assert_eq!(outcome.report.unwrap().realized_profit, dec!(51.20));
    }
}
