//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::Stat;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Population filters for distribution sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Maps a player must have on the hero to be sampled
    pub min_maps: u32,
    /// Seconds a player must have on the hero to be sampled
    pub min_time_seconds: u64,
    /// Maximum number of samples read
    pub sample_limit: usize,
}

/// Analytics tuning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Largest gap between consecutive kills of the same fight, in seconds
    #[serde(default = "default_fight_threshold")]
    pub fight_threshold_seconds: f64,

    #[serde(default = "default_min_maps")]
    pub min_maps: u32,

    #[serde(default = "default_min_time")]
    pub min_time_seconds: u64,

    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,

    /// Smallest population a comparison may be made against
    #[serde(default = "default_min_population")]
    pub min_population: usize,

    /// Seconds after an ultimate starts in which a Lúcio death counts as an Ajax
    #[serde(default = "default_ajax_window")]
    pub ajax_window_seconds: f64,

    /// Points per z-score for each scored MVP statistic
    #[serde(default = "default_mvp_weights")]
    pub mvp_weights: BTreeMap<Stat, f64>,
}

fn default_fight_threshold() -> f64 {
    15.0
}

fn default_min_maps() -> u32 {
    3
}

fn default_min_time() -> u64 {
    600
}

fn default_sample_limit() -> usize {
    1000
}

fn default_min_population() -> usize {
    10
}

fn default_ajax_window() -> f64 {
    2.0
}

fn default_mvp_weights() -> BTreeMap<Stat, f64> {
    BTreeMap::from([
        (Stat::FinalBlows, 1.5),
        (Stat::Eliminations, 1.0),
        (Stat::HeroDamageDealt, 1.25),
        (Stat::HealingDealt, 1.25),
        (Stat::DamageBlocked, 0.75),
        (Stat::Assists, 0.5),
        (Stat::Deaths, 1.0),
    ])
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            fight_threshold_seconds: default_fight_threshold(),
            min_maps: default_min_maps(),
            min_time_seconds: default_min_time(),
            sample_limit: default_sample_limit(),
            min_population: default_min_population(),
            ajax_window_seconds: default_ajax_window(),
            mvp_weights: default_mvp_weights(),
        }
    }
}

impl AnalyticsConfig {
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            min_maps: self.min_maps,
            min_time_seconds: self.min_time_seconds,
            sample_limit: self.sample_limit,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fight_threshold_seconds.is_finite() || self.fight_threshold_seconds <= 0.0 {
            return Err(ConfigError::ValidationError(
                "Fight threshold must be a positive number of seconds".to_string(),
            ));
        }

        if self.sample_limit == 0 {
            return Err(ConfigError::ValidationError(
                "Sample limit must be greater than 0".to_string(),
            ));
        }

        if self.min_population < 2 {
            return Err(ConfigError::ValidationError(
                "Minimum population must be at least 2".to_string(),
            ));
        }

        if !self.ajax_window_seconds.is_finite() || self.ajax_window_seconds <= 0.0 {
            return Err(ConfigError::ValidationError(
                "Ajax window must be a positive number of seconds".to_string(),
            ));
        }

        for (stat, weight) in &self.mvp_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "MVP weight for {} must be a non-negative number",
                    stat
                )));
            }
            if !stat.is_rate() {
                return Err(ConfigError::ValidationError(format!(
                    "{} cannot be scored per 10 minutes",
                    stat
                )));
            }
        }

        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            analytics: AnalyticsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analytics.validate()?;

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
