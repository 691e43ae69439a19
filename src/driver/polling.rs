use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::clock::Clock;
use super::state::{DriverPhase, DriverState};
use crate::common::errors::Result;
use crate::common::traits::Gateway;
use crate::common::types::{Bar, Side};
use crate::config::types::AppSettings;
use crate::strategy::MartingaleStrategy;

/// Delays used by the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    /// Delay between polls while the latest bar is unchanged
    pub bar_poll_interval: Duration,
    /// Delay after a failed bar fetch
    pub bar_retry_delay: Duration,
    /// Delay after a failed processing cycle
    pub error_cooldown: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            bar_poll_interval: Duration::from_secs(5),
            bar_retry_delay: Duration::from_secs(5),
            error_cooldown: Duration::from_secs(60),
        }
    }
}

impl From<&AppSettings> for DriverSettings {
    fn from(settings: &AppSettings) -> Self {
        Self {
            bar_poll_interval: Duration::from_secs(settings.bar_poll_interval_seconds),
            bar_retry_delay: Duration::from_secs(settings.bar_retry_delay_seconds),
            error_cooldown: Duration::from_secs(settings.error_cooldown_seconds),
        }
    }
}

/// Bar-driven loop around a [`MartingaleStrategy`]
///
/// ```text
///  WaitingForBar ──new bar──▶ Processing ──done / error+cooldown──▶ WaitingForBar
///       │  ▲
///       └──┘ fetch failure: sleep(retry delay)
/// ```
pub struct PollingDriver<G: Gateway + ?Sized, C: Clock> {
    gateway: Arc<G>,
    strategy: MartingaleStrategy,
    clock: C,
    settings: DriverSettings,
    state: DriverState,
}

impl<G: Gateway + ?Sized, C: Clock> PollingDriver<G, C> {
    pub fn new(gateway: Arc<G>, strategy: MartingaleStrategy, clock: C, settings: DriverSettings) -> Self {
        Self {
            gateway,
            strategy,
            clock,
            settings,
            state: DriverState::new(),
        }
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Block until a bar strictly newer than the last one seen appears
    ///
    /// Fetch failures are logged and retried after `bar_retry_delay`; this
    /// never returns an error.
    pub async fn wait_for_new_bar(&mut self) -> Bar {
        self.state.phase = DriverPhase::WaitingForBar;
        let params = self.strategy.params();

        loop {
            match self
                .gateway
                .latest_bar(params.instrument(), params.timeframe())
                .await
            {
                Ok(bar) => {
                    let seeded = self.state.last_seen_bar.is_none();
                    if self.state.observe_bar(bar.time) {
                        debug!(bar_time = %bar.time, "New bar");
                        self.state.phase = DriverPhase::Processing;
                        return bar;
                    }
                    if seeded {
                        info!(
                            bar_time = %bar.time,
                            timeframe = %params.timeframe(),
                            "Seeded bar clock, waiting for the next bar"
                        );
                    }
                    self.clock.sleep(self.settings.bar_poll_interval).await;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        transient = e.is_transient(),
                        retry_in_secs = self.settings.bar_retry_delay.as_secs(),
                        "Failed to get bars for {}",
                        params.instrument()
                    );
                    self.clock.sleep(self.settings.bar_retry_delay).await;
                }
            }
        }
    }

    /// Run the open checks, and the close checks when due
    ///
    /// Buy is always evaluated before sell, and both opens before any close.
    /// The close counter resets after every close check whether or not
    /// anything was closed.
    #[instrument(skip(self), fields(bar = ?self.state.last_seen_bar))]
    pub async fn process_cycle(&mut self) -> Result<()> {
        self.state.phase = DriverPhase::Processing;

        for side in Side::ALL {
            self.strategy.evaluate_open(self.gateway.as_ref(), side).await?;
        }

        let period = self.strategy.params().close_check_period();
        if self.state.record_cycle(period) {
            debug!(period, "Close check due");
            for side in Side::ALL {
                self.strategy.evaluate_close(self.gateway.as_ref(), side).await?;
            }
            self.state.reset_close_counter();
        }

        self.state.phase = DriverPhase::WaitingForBar;
        Ok(())
    }

    /// One supervised iteration: wait for a bar, then process it
    ///
    /// A failed cycle is logged and followed by `error_cooldown`.
    pub async fn step(&mut self) {
        self.wait_for_new_bar().await;

        if let Err(e) = self.process_cycle().await {
            error!(
                error = %e,
                cooldown_secs = self.settings.error_cooldown.as_secs(),
                bars_since_close_check = self.state.bars_since_close_check,
                "Processing cycle failed"
            );
            self.state.phase = DriverPhase::WaitingForBar;
            self.clock.sleep(self.settings.error_cooldown).await;
        }
    }

    /// Loop forever
    pub async fn run(&mut self) {
        info!(
            instrument = self.strategy.params().instrument(),
            timeframe = %self.strategy.params().timeframe(),
            "Starting polling loop"
        );
        loop {
            self.step().await;
        }
    }

    /// Loop until `shutdown` resolves
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tokio::select! {
            biased;
            _ = &mut shutdown => info!("Shutdown requested, leaving polling loop"),
            _ = self.run() => {}
        }
    }
}
