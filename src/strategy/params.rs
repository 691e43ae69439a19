use rust_decimal::Decimal;

use crate::common::errors::{BotError, Result};
use crate::common::types::Timeframe;
use crate::config::types::StrategyConfig;

/// Validated, immutable strategy parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyParameters {
    instrument: String,
    start_lot_size: Decimal,
    lot_multiplier: Decimal,
    profit_margin: Decimal,
    threshold_distance: Decimal,
    close_check_period: u32,
    timeframe: Timeframe,
}

impl StrategyParameters {
    pub fn new(
        instrument: impl Into<String>,
        start_lot_size: Decimal,
        lot_multiplier: Decimal,
        profit_margin: Decimal,
        threshold_distance: Decimal,
        close_check_period: u32,
    ) -> Result<Self> {
        let instrument = instrument.into();
        if instrument.trim().is_empty() {
            return Err(BotError::Configuration("instrument must not be empty".into()));
        }
        if start_lot_size <= Decimal::ZERO {
            return Err(BotError::Configuration(format!(
                "start lot size must be positive, got {}",
                start_lot_size
            )));
        }
        if profit_margin < Decimal::ZERO {
            return Err(BotError::Configuration(format!(
                "profit margin must not be negative, got {}",
                profit_margin
            )));
        }
        if threshold_distance < Decimal::ZERO {
            return Err(BotError::Configuration(format!(
                "threshold distance must not be negative, got {}",
                threshold_distance
            )));
        }
        if close_check_period == 0 {
            return Err(BotError::Configuration(
                "close check period must be at least 1 bar".into(),
            ));
        }

        Ok(Self {
            instrument,
            start_lot_size,
            lot_multiplier,
            profit_margin,
            threshold_distance,
            close_check_period,
            timeframe: Timeframe::default(),
        })
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn start_lot_size(&self) -> Decimal {
        self.start_lot_size
    }

    pub fn lot_multiplier(&self) -> Decimal {
        self.lot_multiplier
    }

    pub fn profit_margin(&self) -> Decimal {
        self.profit_margin
    }

    pub fn threshold_distance(&self) -> Decimal {
        self.threshold_distance
    }

    pub fn close_check_period(&self) -> u32 {
        self.close_check_period
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }
}

impl TryFrom<&StrategyConfig> for StrategyParameters {
    type Error = BotError;

    fn try_from(config: &StrategyConfig) -> Result<Self> {
        Ok(Self::new(
            config.symbol.clone(),
            config.start_lot,
            config.lot_multiplier,
            config.profit_margin,
            config.threshold_distance,
            config.close_check_period,
        )?
        .with_timeframe(config.timeframe))
    }
}
