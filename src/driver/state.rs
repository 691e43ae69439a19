use chrono::{DateTime, Utc};
use serde::Serialize;

/// Phase of the polling state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DriverPhase {
    #[default]
    WaitingForBar,
    Processing,
}

/// Per-process cadence state, never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverState {
    /// Opening time of the newest bar seen so far
    pub last_seen_bar: Option<DateTime<Utc>>,
    /// Processing cycles since the last close evaluation
    pub bars_since_close_check: u32,
    pub phase: DriverPhase,
}

impl DriverState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a polled bar time.
    ///
    /// Returns true only for a bar strictly newer than the last one seen. The
    /// first bar ever observed seeds the state and returns false.
    pub fn observe_bar(&mut self, time: DateTime<Utc>) -> bool {
        match self.last_seen_bar {
            None => {
                self.last_seen_bar = Some(time);
                false
            }
            Some(last) if time > last => {
                self.last_seen_bar = Some(time);
                true
            }
            Some(_) => false,
        }
    }

    /// Count one processing cycle; returns true when a close check is due
    pub fn record_cycle(&mut self, close_check_period: u32) -> bool {
        self.bars_since_close_check += 1;
        self.bars_since_close_check >= close_check_period
    }

    pub fn reset_close_counter(&mut self) {
        self.bars_since_close_check = 0;
    }
}
