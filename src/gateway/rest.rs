//! REST API client for the MetaTrader 5 bridge

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::messages::*;
use crate::common::errors::{BotError, Result};
use crate::common::types::Timeframe;
use crate::config::types::AccountCredentials;

/// Thin JSON client for the bridge endpoints
#[derive(Debug, Clone)]
pub struct Mt5RestClient {
    /// HTTP client
    client: Client,
    /// Base URL of the bridge
    base_url: Url,
}

impl Mt5RestClient {
    /// Create a new REST client
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Internal(e.to_string()))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| BotError::Configuration(format!("Invalid bridge URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BotError::Configuration(format!(
                "Bridge URL '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Bridge URL for `segments`, each one percent-encoded as a single path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Attach the bridge to a terminal
    #[instrument(skip(self))]
    pub async fn initialize(&self, terminal_path: Option<&str>) -> Result<()> {
        let url = self.endpoint(&["initialize"]);
        let body = InitializeRequest {
            path: terminal_path.map(str::to_string),
        };
        let status: BridgeStatus = Self::parse(self.client.post(url).json(&body).send().await?).await?;
        if !status.ok {
            return Err(BotError::Internal(format!(
                "MT5 initialization failed: {}",
                status.message.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Log in to the trading account
    #[instrument(skip(self, credentials), fields(login = credentials.login, server = %credentials.server))]
    pub async fn login(&self, credentials: &AccountCredentials) -> Result<()> {
        let url = self.endpoint(&["login"]);
        let body = LoginRequest {
            login: credentials.login,
            password: credentials.password.clone(),
            server: credentials.server.clone(),
        };
        let status: BridgeStatus = Self::parse(self.client.post(url).json(&body).send().await?).await?;
        if !status.ok {
            return Err(BotError::Authentication(format!(
                "MT5 login failed: {}",
                status.message.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Detach from the terminal
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        let url = self.endpoint(&["shutdown"]);
        let status: BridgeStatus = Self::parse(self.client.post(url).send().await?).await?;
        if !status.ok {
            return Err(BotError::Internal(format!(
                "MT5 shutdown failed: {}",
                status.message.unwrap_or_default()
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Market data
    // ========================================================================

    /// Symbol properties, `None` if the broker does not know the symbol
    #[instrument(skip(self))]
    pub async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfoResponse>> {
        let url = self.endpoint(&["symbols", symbol]);
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::parse(response).await.map(Some)
    }

    /// Show a symbol in Market Watch
    #[instrument(skip(self))]
    pub async fn symbol_select(&self, symbol: &str, enable: bool) -> Result<bool> {
        let url = self.endpoint(&["symbols", symbol, "select"]);
        let body = SymbolSelectRequest { enable };
        let status: BridgeStatus = Self::parse(self.client.post(url).json(&body).send().await?).await?;
        Ok(status.ok)
    }

    /// Last tick for a symbol
    ///
    /// A missing tick is reported as [`BotError::Transient`].
    #[instrument(skip(self))]
    pub async fn tick(&self, symbol: &str) -> Result<TickResponse> {
        let url = self.endpoint(&["ticks", symbol]);
        debug!("Fetching tick from: {}", url);

        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BotError::Transient(format!(
                "Failed to get tick data for {}",
                symbol
            )));
        }
        Self::parse(response).await
    }

    /// Most recent bars, oldest first
    #[instrument(skip(self))]
    pub async fn rates_from_pos(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: u32,
        count: u32,
    ) -> Result<Vec<RateRecord>> {
        let url = self.endpoint(&["rates", symbol]);
        debug!("Fetching rates from: {}", url);

        let response = self
            .client
            .get(url)
            .query(&[
                ("timeframe", timeframe.to_string()),
                ("start", start.to_string()),
                ("count", count.to_string()),
            ])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BotError::Transient(format!(
                "Failed to get candles for {}",
                symbol
            )));
        }
        Self::parse(response).await
    }

    // ========================================================================
    // Trading
    // ========================================================================

    /// Open positions on a symbol
    #[instrument(skip(self))]
    pub async fn positions(&self, symbol: &str) -> Result<Vec<PositionRecord>> {
        let url = self.endpoint(&["positions"]);
        let response = self.client.get(url).query(&[("symbol", symbol)]).send().await?;
        Self::parse(response).await
    }

    /// Send a trade request
    ///
    /// The bridge answers 200 with the terminal's retcode even for rejected
    /// orders; checking it is left to the caller.
    #[instrument(skip(self, request), fields(symbol = %request.symbol, volume = %request.volume, position = ?request.position))]
    pub async fn order_send(&self, request: &TradeRequest) -> Result<TradeResult> {
        let url = self.endpoint(&["orders"]);
        let response = self.client.post(url).json(request).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::InvalidResponse(format!(
                "Bridge returned status {}: {}",
                status, body
            )));
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
