use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on the configurable inter-attempt delay. Anything beyond this
/// would stall the nightly content run rather than pace it.
const MAX_RETRY_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gate: GateSettings,

    #[serde(default)]
    pub experiment: ExperimentSettings,

    #[serde(default)]
    pub providers: ProvidersSettings,

    #[serde(default)]
    pub scoring: ScoringSettings,
}

impl Config {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gate.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "gate.max_attempts must be at least 1".into(),
            ));
        }
        if self.gate.acceptable_floor > self.gate.pass_threshold {
            return Err(ConfigError::Validation(format!(
                "gate.acceptable_floor ({}) exceeds gate.pass_threshold ({})",
                self.gate.acceptable_floor, self.gate.pass_threshold
            )));
        }
        if self.gate.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "gate.retry_delay_ms ({}) exceeds the {MAX_RETRY_DELAY_MS}ms cap",
                self.gate.retry_delay_ms
            )));
        }
        if self.experiment.min_impressions == 0 {
            return Err(ConfigError::Validation(
                "experiment.min_impressions must be at least 1".into(),
            ));
        }
        if !(self.experiment.confidence_bar > 0.0 && self.experiment.confidence_bar <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "experiment.confidence_bar ({}) must be in (0, 1]",
                self.experiment.confidence_bar
            )));
        }
        Ok(())
    }
}

// ─── Quality gate ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSettings {
    /// Score at or above which an artifact passes immediately.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    /// "Good enough" floor for accepting the best candidate after the retry
    /// budget is exhausted. Also the hard cutoff: nothing below it ships.
    #[serde(default = "default_acceptable_floor")]
    pub acceptable_floor: f64,
    /// Retry budget per cycle; the fallback call is not counted against it.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Explicit inter-attempt delay. Zero fires attempts back-to-back.
    #[serde(default)]
    pub retry_delay_ms: u64,
    /// Whether a below-threshold best candidate may be force-accepted.
    #[serde(default = "default_true")]
    pub accept_below_threshold: bool,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            pass_threshold: default_pass_threshold(),
            acceptable_floor: default_acceptable_floor(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: 0,
            accept_below_threshold: true,
        }
    }
}

fn default_pass_threshold() -> f64 {
    70.0
}

fn default_acceptable_floor() -> f64 {
    50.0
}

fn default_max_attempts() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

// ─── Experiments ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSettings {
    /// Minimum impressions per variant before a winner-check may run.
    #[serde(default = "default_min_impressions")]
    pub min_impressions: u64,
    /// Confidence a variant must reach to be declared the winner.
    #[serde(default = "default_confidence_bar")]
    pub confidence_bar: f64,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            min_impressions: default_min_impressions(),
            confidence_bar: default_confidence_bar(),
        }
    }
}

fn default_min_impressions() -> u64 {
    100
}

fn default_confidence_bar() -> f64 {
    0.95
}

// ─── Generation providers ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersSettings {
    /// Primary (cheap) provider used for every budgeted attempt.
    #[serde(default = "ProviderSettings::default_primary")]
    pub primary: ProviderSettings,
    /// Optional higher-cost fallback invoked once per exhausted cycle.
    #[serde(default)]
    pub fallback: Option<ProviderSettings>,
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            primary: ProviderSettings::default_primary(),
            fallback: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl ProviderSettings {
    fn default_primary() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
        }
    }

    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

// ─── Scoring oracles ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Judge model for article SEO scoring.
    #[serde(default = "default_model")]
    pub model: String,
    /// Judge model for hero-image scoring.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            vision_model: default_vision_model(),
        }
    }
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}
