//! Bar-driven polling loop that supervises the strategy

pub mod clock;
mod polling;
mod state;

pub use clock::{Clock, ManualClock, TokioClock};
pub use polling::{DriverSettings, PollingDriver};
pub use state::{DriverPhase, DriverState};
