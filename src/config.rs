//! Application configuration: YAML file plus `SCOUT_*` environment overrides.
//!
//! ```yaml
//! database:
//!   path: ~/.commander-scout/scout.db
//! moxfield:
//!   rate_limit: 2.0
//! scoring:
//!   category_weights: { signature: 3.0, high_synergy: 2.0, staple: 1.5, basic: 1.0 }
//!   thresholds: { critical: 3.0, high: 2.0, medium: 1.0 }
//! recommendations:
//!   min_completion: 0.6
//!   limit: 20
//!   sort_by: buildability
//!   colors: [B, G]          # optional exact color identity
//! logging:
//!   level: info
//! ```
//!
//! Every field is optional; missing ones take the defaults above.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, ScoutError};
use crate::providers::HttpSettings;
use crate::ranking::RankingOptions;
use crate::scoring::ScoringConfig;

const APP_USER_AGENT: &str = concat!("commander-scout/", env!("CARGO_PKG_VERSION"));

fn default_db_path() -> String {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => format!("{}/.commander-scout/scout.db", home),
        _ => ".commander-scout/scout.db".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// File path, or `:memory:`
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    /// Path with a leading `~/` expanded against `$HOME`
    pub fn resolved_path(&self) -> String {
        match (self.path.strip_prefix("~/"), std::env::var("HOME")) {
            (Some(rest), Ok(home)) if !home.is_empty() => format!("{}/{}", home.trim_end_matches('/'), rest),
            _ => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoxfieldConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    /// Requests per second
    pub rate_limit: f64,
}

impl Default for MoxfieldConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api2.moxfield.com/v2".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_secs: 1.0,
            rate_limit: 2.0,
        }
    }
}

impl MoxfieldConfig {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            retry_delay_secs: self.retry_delay_secs,
            rate_limit: self.rate_limit,
            user_agent: APP_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdhrecConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    /// Requests per second
    pub rate_limit: f64,
    pub user_agent: String,
}

impl Default for EdhrecConfig {
    fn default() -> Self {
        Self {
            base_url: "https://json.edhrec.com/pages".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_secs: 2.0,
            rate_limit: 1.5,
            user_agent: APP_USER_AGENT.to_string(),
        }
    }
}

impl EdhrecConfig {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            retry_delay_secs: self.retry_delay_secs,
            rate_limit: self.rate_limit,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing level or EnvFilter directive
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub moxfield: MoxfieldConfig,
    pub edhrec: EdhrecConfig,
    pub scoring: ScoringConfig,
    pub recommendations: RankingOptions,
    pub logging: LoggingConfig,
}

fn parse_env<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ScoutError::Config(format!("{} has an invalid value: '{}'", name, raw)))
}

impl AppConfig {
    /// Load from `path` (or defaults when `None`), apply env overrides, validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScoutError::Config(format!("config file not found: {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply `SCOUT_*` overrides read through `lookup`
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SCOUT_DB_PATH") {
            self.database.path = path;
        }
        if let Some(level) = lookup("SCOUT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(raw) = lookup("SCOUT_MOXFIELD_RATE_LIMIT") {
            self.moxfield.rate_limit = parse_env("SCOUT_MOXFIELD_RATE_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("SCOUT_MOXFIELD_TIMEOUT") {
            self.moxfield.timeout_secs = parse_env("SCOUT_MOXFIELD_TIMEOUT", &raw)?;
        }
        if let Some(raw) = lookup("SCOUT_EDHREC_RATE_LIMIT") {
            self.edhrec.rate_limit = parse_env("SCOUT_EDHREC_RATE_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("SCOUT_EDHREC_TIMEOUT") {
            self.edhrec.timeout_secs = parse_env("SCOUT_EDHREC_TIMEOUT", &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("moxfield.rate_limit", self.moxfield.rate_limit),
            ("edhrec.rate_limit", self.edhrec.rate_limit),
        ] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(ScoutError::Config(format!("{} must be positive, got {}", name, rate)));
            }
            if Duration::try_from_secs_f64(1.0 / rate).is_err() {
                return Err(ScoutError::Config(format!("{} is too small, got {}", name, rate)));
            }
        }
        for (name, delay) in [
            ("moxfield.retry_delay_secs", self.moxfield.retry_delay_secs),
            ("edhrec.retry_delay_secs", self.edhrec.retry_delay_secs),
        ] {
            if Duration::try_from_secs_f64(delay).is_err() {
                return Err(ScoutError::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, delay
                )));
            }
        }
        for (name, timeout) in [
            ("moxfield.timeout_secs", self.moxfield.timeout_secs),
            ("edhrec.timeout_secs", self.edhrec.timeout_secs),
        ] {
            if timeout == 0 {
                return Err(ScoutError::Config(format!("{} must be positive", name)));
            }
        }
        if self.database.path.trim().is_empty() {
            return Err(ScoutError::Config("database.path cannot be empty".to_string()));
        }

        self.scoring.validate()?;

        let rec = &self.recommendations;
        if !(0.0..=1.0).contains(&rec.min_completion) {
            return Err(ScoutError::Config(format!(
                "recommendations.min_completion must be within [0, 1], got {}",
                rec.min_completion
            )));
        }
        if rec.limit == 0 {
            return Err(ScoutError::Config("recommendations.limit must be greater than 0".to_string()));
        }
        rec.validate().map_err(|e| ScoutError::Config(e.to_string()))?;

        Ok(())
    }
}
