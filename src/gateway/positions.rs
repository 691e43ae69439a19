//! Side aggregates computed from a broker position list

use rust_decimal::Decimal;

use crate::common::types::{AggregatePositionInfo, OpenPosition, PriceQuote, Side};

/// Aggregate the positions of `side`, ignoring the other side
///
/// `total_value` is marked at the side's current price (ask for buys, bid for
/// sells).
pub fn aggregate_side(
    positions: &[OpenPosition],
    side: Side,
    quote: &PriceQuote,
    contract_size: Decimal,
) -> AggregatePositionInfo {
    let mark = side.entry_price(quote);
    let mut info = AggregatePositionInfo::flat();

    for pos in positions.iter().filter(|p| p.side == side) {
        info.total_lots += pos.volume;
        info.total_value += pos.volume * contract_size * mark;
        info.position_count += 1;
        info.floating_profit += pos.profit;
        info.extreme_entry_price = Some(match (side, info.extreme_entry_price) {
            (_, None) => pos.price_open,
            (Side::Buy, Some(low)) => low.min(pos.price_open),
            (Side::Sell, Some(high)) => high.max(pos.price_open),
        });
    }

    info
}

/// Volume-weighted average entry price of `side`, `None` without volume
pub fn break_even_price(positions: &[OpenPosition], side: Side) -> Option<Decimal> {
    let (volume, cost) = positions
        .iter()
        .filter(|p| p.side == side)
        .fold((Decimal::ZERO, Decimal::ZERO), |(v, c), p| {
            (v + p.volume, c + p.volume * p.price_open)
        });

    if volume.is_zero() {
        None
    } else {
        Some(cost / volume)
    }
}
