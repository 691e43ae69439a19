//! In-memory gateway for dry runs and tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::positions::{aggregate_side, break_even_price};
use crate::common::errors::{BotError, Result};
use crate::common::traits::Gateway;
use crate::common::types::{
    AggregatePositionInfo, Bar, CloseReport, OpenPosition, OrderConfirmation, PriceQuote, Side,
    Timeframe,
};

/// Scripted answer for one `latest_bar` call
#[derive(Debug, Clone)]
enum BarScript {
    Bar(DateTime<Utc>),
    Failure(String),
}

/// Everything the paper account knows
#[derive(Debug, Default)]
struct PaperBook {
    quote: Option<PriceQuote>,
    positions: Vec<OpenPosition>,
    next_ticket: u64,
    bars: VecDeque<BarScript>,
    reject_orders: Option<(u32, String)>,
    opened: Vec<OrderConfirmation>,
    closes: Vec<CloseReport>,
    realized_profit: Decimal,
}

/// Simulated account for a single instrument
///
/// Orders fill at the current ask (buy) or bid (sell). Bars come from the
/// script while it lasts, then from the wall clock floored to the timeframe.
#[derive(Debug)]
pub struct PaperGateway {
    instrument: String,
    contract_size: Decimal,
    book: Mutex<PaperBook>,
}

impl PaperGateway {
    pub fn new(instrument: impl Into<String>, contract_size: Decimal) -> Self {
        Self {
            instrument: instrument.into(),
            contract_size,
            book: Mutex::new(PaperBook {
                next_ticket: 1,
                ..PaperBook::default()
            }),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn set_quote(&self, bid: Decimal, ask: Decimal) {
        self.lock().quote = Some(PriceQuote::new(bid, ask));
    }

    /// Insert an existing position, as if opened before start-up
    pub fn insert_position(&self, side: Side, volume: Decimal, price_open: Decimal) -> u64 {
        let mut book = self.lock();
        let ticket = book.next_ticket;
        book.next_ticket += 1;
        book.positions.push(OpenPosition {
            ticket,
            side,
            volume,
            price_open,
            profit: Decimal::ZERO,
        });
        ticket
    }

    /// Queue a bar for a future `latest_bar` call
    pub fn push_bar(&self, time: DateTime<Utc>) {
        self.lock().bars.push_back(BarScript::Bar(time));
    }

    /// Queue a failed `latest_bar` call
    pub fn push_bar_failure(&self, message: impl Into<String>) {
        self.lock().bars.push_back(BarScript::Failure(message.into()));
    }

    /// Reject every following order with `retcode`; `None` accepts again
    pub fn reject_orders(&self, rejection: Option<(u32, String)>) {
        self.lock().reject_orders = rejection;
    }

    pub fn positions(&self) -> Vec<OpenPosition> {
        self.lock().positions.clone()
    }

    pub fn positions_on(&self, side: Side) -> Vec<OpenPosition> {
        self.lock()
            .positions
            .iter()
            .filter(|p| p.side == side)
            .cloned()
            .collect()
    }

    /// Every filled open order, in order
    pub fn opened_orders(&self) -> Vec<OrderConfirmation> {
        self.lock().opened.clone()
    }

    /// Every close-all request served, in order
    pub fn close_reports(&self) -> Vec<CloseReport> {
        self.lock().closes.clone()
    }

    pub fn realized_profit(&self) -> Decimal {
        self.lock().realized_profit
    }

    fn lock(&self) -> MutexGuard<'_, PaperBook> {
        // the book stays consistent between statements, so a poisoned lock is still usable
        self.book.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_instrument(&self, instrument: &str) -> Result<()> {
        if instrument == self.instrument {
            Ok(())
        } else {
            Err(BotError::InstrumentNotFound(instrument.to_string()))
        }
    }

    fn quote(book: &PaperBook, instrument: &str) -> Result<PriceQuote> {
        book.quote
            .ok_or_else(|| BotError::Transient(format!("Failed to get tick data for {}", instrument)))
    }

    /// Profit of a position if closed at `quote`
    fn position_profit(&self, pos: &OpenPosition, quote: &PriceQuote) -> Decimal {
        pos.side.sign() * (pos.side.exit_price(quote) - pos.price_open) * pos.volume * self.contract_size
    }
}

#[async_trait]
impl Gateway for PaperGateway {
    async fn connect(&self) -> Result<()> {
        info!(instrument = %self.instrument, "Paper account ready");
        Ok(())
    }

    async fn aggregate_position_info(
        &self,
        instrument: &str,
        side: Side,
    ) -> Result<AggregatePositionInfo> {
        self.check_instrument(instrument)?;
        let book = self.lock();
        if !book.positions.iter().any(|p| p.side == side) {
            return Ok(AggregatePositionInfo::flat());
        }
        let quote = Self::quote(&book, instrument)?;
        let marked: Vec<OpenPosition> = book
            .positions
            .iter()
            .map(|p| OpenPosition {
                profit: self.position_profit(p, &quote),
                ..p.clone()
            })
            .collect();
        Ok(aggregate_side(&marked, side, &quote, self.contract_size))
    }

    async fn break_even_price(&self, instrument: &str, side: Side) -> Result<Option<Decimal>> {
        self.check_instrument(instrument)?;
        Ok(break_even_price(&self.lock().positions, side))
    }

    async fn price_quote(&self, instrument: &str) -> Result<PriceQuote> {
        self.check_instrument(instrument)?;
        Self::quote(&self.lock(), instrument)
    }

    async fn open_position(
        &self,
        instrument: &str,
        side: Side,
        lots: Decimal,
    ) -> Result<OrderConfirmation> {
        self.check_instrument(instrument)?;
        if lots <= Decimal::ZERO {
            return Err(BotError::OrderRejected {
                retcode: 10014,
                message: format!("Invalid volume {}", lots),
            });
        }

        let mut book = self.lock();
        if let Some((retcode, message)) = &book.reject_orders {
            return Err(BotError::OrderRejected {
                retcode: *retcode,
                message: message.clone(),
            });
        }

        let price = side.entry_price(&Self::quote(&book, instrument)?);
        let ticket = book.next_ticket;
        book.next_ticket += 1;
        book.positions.push(OpenPosition {
            ticket,
            side,
            volume: lots,
            price_open: price,
            profit: Decimal::ZERO,
        });

        let confirmation = OrderConfirmation {
            ticket,
            side,
            volume: lots,
            price,
        };
        book.opened.push(confirmation.clone());
        debug!(side = %side, lots = %lots, price = %price, ticket, "Paper fill");
        Ok(confirmation)
    }

    async fn close_all_positions(&self, instrument: &str, side: Side) -> Result<CloseReport> {
        self.check_instrument(instrument)?;
        let mut book = self.lock();
        let quote = Self::quote(&book, instrument)?;

        let (closing, keep): (Vec<OpenPosition>, Vec<OpenPosition>) =
            book.positions.drain(..).partition(|p| p.side == side);
        book.positions = keep;

        let mut report = CloseReport::empty(side);
        for pos in &closing {
            report.closed += 1;
            report.realized_profit += self.position_profit(pos, &quote);
        }
        book.realized_profit += report.realized_profit;
        book.closes.push(report.clone());
        Ok(report)
    }

    async fn latest_bar(&self, instrument: &str, timeframe: Timeframe) -> Result<Bar> {
        self.check_instrument(instrument)?;
        match self.lock().bars.pop_front() {
            Some(BarScript::Bar(time)) => Ok(Bar::new(time)),
            Some(BarScript::Failure(message)) => Err(BotError::Transient(message)),
            None => Ok(Bar::new(timeframe.bar_open(Utc::now()))),
        }
    }

    fn gateway_name(&self) -> &'static str {
        "paper"
    }
}
