//! Application configuration.

use crate::error::{AppError, AppResult};
use carry_gateway::binance::BinanceConfig;
use carry_gateway::bybit::BybitConfig;
use carry_orders::ExecutionConfig;
use carry_scanner::ScannerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// HTTP settings for the entry venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceSettings {
    #[serde(default = "default_binance_base_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
}

fn default_binance_base_url() -> String {
    "https://fapi.binance.com".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_recv_window_ms() -> u64 {
    5000
}

impl Default for BinanceSettings {
    fn default() -> Self {
        Self {
            base_url: default_binance_base_url(),
            timeout_secs: default_http_timeout_secs(),
            recv_window_ms: default_recv_window_ms(),
        }
    }
}

impl From<&BinanceSettings> for BinanceConfig {
    fn from(settings: &BinanceSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            recv_window_ms: settings.recv_window_ms,
        }
    }
}

/// HTTP settings for the confirmation venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BybitSettings {
    #[serde(default = "default_bybit_base_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bybit_base_url() -> String {
    "https://api.bybit.com".to_string()
}

impl Default for BybitSettings {
    fn default() -> Self {
        Self {
            base_url: default_bybit_base_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl From<&BybitSettings> for BybitConfig {
    fn from(settings: &BybitSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Scan thresholds and candidate cap.
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Per-ticker sizing and margin settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Seconds before each funding reset to fire the cycle.
    #[serde(default = "default_lead_time_secs")]
    pub lead_time_secs: u64,
    /// Funding settlement cadence in hours. Must divide 24.
    #[serde(default = "default_funding_reset_hours")]
    pub funding_reset_hours: u32,
    /// How long positions are held before the exit batch, in minutes.
    #[serde(default = "default_holding_minutes")]
    pub holding_minutes: u64,
    /// Interval of the informational candidate poll, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Entry venue HTTP settings.
    #[serde(default)]
    pub binance: BinanceSettings,
    /// Confirmation venue HTTP settings.
    #[serde(default)]
    pub bybit: BybitSettings,
}

fn default_lead_time_secs() -> u64 {
    15
}

fn default_funding_reset_hours() -> u32 {
    8
}

fn default_holding_minutes() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            execution: ExecutionConfig::default(),
            lead_time_secs: default_lead_time_secs(),
            funding_reset_hours: default_funding_reset_hours(),
            holding_minutes: default_holding_minutes(),
            poll_interval_secs: default_poll_interval_secs(),
            binance: BinanceSettings::default(),
            bybit: BybitSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("CARRY_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// The holding window must stay inside the trigger interval: the
    /// coordinator's holding wait blocks the only cycle loop, so a
    /// longer hold would silently delay the next trigger.
    pub fn validate(&self) -> AppResult<()> {
        self.scanner.validate().map_err(AppError::Config)?;
        self.execution.validate().map_err(AppError::Config)?;

        if self.funding_reset_hours == 0 || 24 % self.funding_reset_hours != 0 {
            return Err(AppError::Config(format!(
                "funding_reset_hours ({}) must divide 24",
                self.funding_reset_hours
            )));
        }

        let interval_secs = u64::from(self.funding_reset_hours) * 3600;
        if self.holding_minutes * 60 >= interval_secs {
            return Err(AppError::Config(format!(
                "holding_minutes ({}) must be shorter than the {}h trigger interval",
                self.holding_minutes, self.funding_reset_hours
            )));
        }

        if self.lead_time_secs >= interval_secs {
            return Err(AppError::Config(format!(
                "lead_time_secs ({}) must be shorter than the trigger interval",
                self.lead_time_secs
            )));
        }

        if self.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Holding window as a duration.
    pub fn holding_duration(&self) -> Duration {
        Duration::from_secs(self.holding_minutes * 60)
    }

    /// Lead time as a chrono duration for trigger arithmetic.
    pub fn lead_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lead_time_secs as i64)
    }
}
