use rust_decimal::Decimal;

use crate::common::types::{CloseReport, OrderConfirmation, Side};

/// Open-side decision for one side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenDecision {
    /// No position on the side yet: start the sequence
    Seed { side: Side, lots: Decimal },
    /// Price moved past the threshold: add a scaled position
    ScaleIn {
        side: Side,
        lots: Decimal,
        reference_price: Decimal,
        trigger_price: Decimal,
    },
    /// Price has not moved far enough
    Hold {
        side: Side,
        reference_price: Decimal,
        trigger_price: Decimal,
    },
}

impl OpenDecision {
    /// Lot size to open, if any
    pub fn lots(&self) -> Option<Decimal> {
        match self {
            Self::Seed { lots, .. } | Self::ScaleIn { lots, .. } => Some(*lots),
            Self::Hold { .. } => None,
        }
    }

    /// Returns true if a position should be opened
    pub fn is_go(&self) -> bool {
        self.lots().is_some()
    }

    pub fn side(&self) -> Side {
        match self {
            Self::Seed { side, .. } | Self::ScaleIn { side, .. } | Self::Hold { side, .. } => *side,
        }
    }

    /// Short label used in log lines
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Seed { .. } => "seed",
            Self::ScaleIn { .. } => "scale_in",
            Self::Hold { .. } => "hold",
        }
    }
}

/// Close-side decision for one side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseDecision {
    /// No open volume on the side
    Flat { side: Side },
    /// Profit target reached: close every position on the side
    Close {
        side: Side,
        break_even: Decimal,
        reference_price: Decimal,
        target_price: Decimal,
    },
    /// Target not reached
    Hold {
        side: Side,
        break_even: Decimal,
        reference_price: Decimal,
        target_price: Decimal,
    },
}

impl CloseDecision {
    /// Returns true if the side should be closed
    pub fn is_go(&self) -> bool {
        matches!(self, Self::Close { .. })
    }

    pub fn side(&self) -> Side {
        match self {
            Self::Flat { side } | Self::Close { side, .. } | Self::Hold { side, .. } => *side,
        }
    }

    /// Signed distance of the reference price from break-even, favourable
    /// moves positive
    pub fn break_even_distance(&self) -> Option<Decimal> {
        match self {
            Self::Flat { .. } => None,
            Self::Close {
                side,
                break_even,
                reference_price,
                ..
            }
            | Self::Hold {
                side,
                break_even,
                reference_price,
                ..
            } => Some(side.sign() * (*reference_price - *break_even)),
        }
    }

    /// Short label used in log lines
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Flat { .. } => "flat",
            Self::Close { .. } => "close",
            Self::Hold { .. } => "hold",
        }
    }
}

/// What `evaluate_open` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOutcome {
    pub decision: OpenDecision,
    /// Broker confirmation when an order was placed
    pub confirmation: Option<OrderConfirmation>,
}

/// What `evaluate_close` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseOutcome {
    pub decision: CloseDecision,
    /// Broker report when a close-all was requested
    pub report: Option<CloseReport>,
}
