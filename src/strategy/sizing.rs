//! Pure martingale decision rules
//!
//! Both rules are written once over [`Side`]: `side.sign()` turns the buy
//! comparison into its sell mirror, so a signed move is positive when it
//! favours the position.

use rust_decimal::{Decimal, MathematicalOps};

use super::params::StrategyParameters;
use super::types::{CloseDecision, OpenDecision};
use crate::common::errors::{BotError, Result};
use crate::common::types::{AggregatePositionInfo, PriceQuote, Side};

/// Lot size for the next position of a sequence
///
/// `round(start_lot x position_count ^ lot_multiplier, 2)`, where
/// `position_count` is the number of positions open before this one.
pub fn next_lot_size(params: &StrategyParameters, position_count: usize) -> Result<Decimal> {
    let count = Decimal::from(position_count as u64);
    let scale = count.checked_powd(params.lot_multiplier()).ok_or_else(|| {
        BotError::Sizing(format!(
            "{}^{} overflows",
            position_count,
            params.lot_multiplier()
        ))
    })?;
    let lots = params
        .start_lot_size()
        .checked_mul(scale)
        .ok_or_else(|| BotError::Sizing(format!("{} x {} overflows", params.start_lot_size(), scale)))?;
    Ok(lots.round_dp(2))
}

/// Decide whether to open a position on `side`
///
/// A flat side is always seeded with the start lot, whatever the price, so
/// `quote` is only consulted when positions exist. Adding a position needs a
/// strictly adverse move: a price exactly `threshold_distance` away holds.
pub fn decide_open(
    params: &StrategyParameters,
    side: Side,
    info: &AggregatePositionInfo,
    quote: Option<&PriceQuote>,
) -> Result<OpenDecision> {
    let extreme = match (info.position_count, info.extreme_entry_price) {
        (0, _) => {
            return Ok(OpenDecision::Seed {
                side,
                lots: params.start_lot_size(),
            })
        }
        (_, Some(price)) => price,
        (count, None) => {
            return Err(BotError::InvalidResponse(format!(
                "{} {} positions reported without an entry price",
                count, side
            )))
        }
    };
    let quote = quote.ok_or_else(|| {
        BotError::Internal(format!("quote required to scale {} positions", side))
    })?;

    let reference_price = side.entry_price(quote);
    let trigger_price = extreme - side.sign() * params.threshold_distance();
    let adverse_move = side.sign() * (extreme - reference_price) > params.threshold_distance();

    if adverse_move {
        Ok(OpenDecision::ScaleIn {
            side,
            lots: next_lot_size(params, info.position_count)?,
            reference_price,
            trigger_price,
        })
    } else {
        Ok(OpenDecision::Hold {
            side,
            reference_price,
            trigger_price,
        })
    }
}

/// Decide whether to close every position on `side`
///
/// Buy closes when `ask > break_even + profit_margin`, sell when
/// `bid < break_even - profit_margin`. Both comparisons are strict.
pub fn decide_close(
    params: &StrategyParameters,
    side: Side,
    break_even: Option<Decimal>,
    quote: &PriceQuote,
) -> CloseDecision {
    let Some(break_even) = break_even else {
        return CloseDecision::Flat { side };
    };

    let reference_price = side.entry_price(quote);
    let target_price = break_even + side.sign() * params.profit_margin();

    if side.sign() * (reference_price - break_even) > params.profit_margin() {
        CloseDecision::Close {
            side,
            break_even,
            reference_price,
            target_price,
        }
    } else {
        CloseDecision::Hold {
            side,
            break_even,
            reference_price,
            target_price,
        }
    }
}
