//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{AppConfig, BrokerConfig};
use crate::common::errors::{BotError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP_, `__` between sections)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| BotError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| BotError::Configuration(e.to_string()))?;

    apply_mt5_env(&mut app.broker)?;
    validate_bridge_url(&app.broker.bridge_url)?;
    Ok(app)
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut broker = BrokerConfig::default();
    if let Ok(url) = std::env::var("MT5_BRIDGE_URL") {
        broker.bridge_url = url;
    }
    apply_mt5_env(&mut broker)?;
    validate_bridge_url(&broker.bridge_url)?;

    Ok(AppConfig {
        broker,
        ..AppConfig::default()
    })
}

/// Fill account fields from the MT5_* variables when the config left them out
fn apply_mt5_env(broker: &mut BrokerConfig) -> Result<()> {
    apply_mt5_vars(broker, |key| std::env::var(key).ok())
}

fn apply_mt5_vars<F>(broker: &mut BrokerConfig, var: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if broker.login.is_none() {
        if let Some(raw) = var("MT5_NUMBER") {
            let login = raw.trim().parse().map_err(|_| {
                BotError::Configuration(format!("MT5_NUMBER is not an account number: {}", raw))
            })?;
            broker.login = Some(login);
        }
    }
    if broker.password.is_none() {
        broker.password = var("MT5_PASSWORD");
    }
    if broker.server.is_none() {
        broker.server = var("MT5_SERVER");
    }
    if broker.terminal_path.is_none() {
        broker.terminal_path = var("MT5_PATH");
    }
    Ok(())
}

fn validate_bridge_url(raw: &str) -> Result<()> {
    let url = url::Url::parse(raw)
        .map_err(|e| BotError::Configuration(format!("Invalid bridge_url '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(BotError::Configuration(format!(
            "Unsupported bridge_url scheme: {}",
            other
        ))),
    }
}
