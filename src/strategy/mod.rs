//! Strategy module for martingale position management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    GATEWAY I/O (async)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MartingaleStrategy                                         │
//! │    - Reads aggregates, break-even and quotes                │
//! │    - Places at most one order per side per call             │
//! │    - Logs every decision                                    │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DECISION RULES (pure)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  decide_open()  → Seed / ScaleIn / Hold                     │
//! │  decide_close() → Flat / Close / Hold                       │
//! │  next_lot_size() = round(start x count ^ multiplier, 2)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`StrategyParameters`]: validated, immutable parameters
//! - [`MartingaleStrategy`]: `evaluate_open` / `evaluate_close` against a gateway
//! - [`OpenDecision`] / [`CloseDecision`]: outputs of the pure rules

mod martingale;
mod params;
mod sizing;
mod types;

pub use martingale::MartingaleStrategy;

pub use params::StrategyParameters;

pub use sizing::{decide_close, decide_open, next_lot_size};

pub use types::{CloseDecision, CloseOutcome, OpenDecision, OpenOutcome};
