use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::ConfigError;

/// Tunables for one inference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InferenceConfig {
    /// Transit count at or below which mutual transit reads as siblings
    /// rather than a clear hierarchy.
    pub threshold: u32,

    /// Bound on the degree ratio of two ASes for them to be considered peers.
    pub degree_size_ratio: f64,

    /// Length of the degree ranking report.
    pub top_k: usize,
}

impl InferenceConfig {
    pub fn new() -> Self {
        InferenceConfig {
            threshold: 1,
            degree_size_ratio: 60.0,
            top_k: 10,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_degree_size_ratio(mut self, ratio: f64) -> Self {
        self.degree_size_ratio = ratio;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Reads a JSON config file. Missing keys fall back to the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Values are checked with the same parsers as the command line, so a
    /// bad value reports its own key rather than a JSON type error.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let loose: LooseConfig = serde_json::from_str(raw)?;
        let mut config = InferenceConfig::default();
        if let Some(value) = &loose.threshold {
            config.threshold = parse_threshold(&value_text(value))?;
        }
        if let Some(value) = &loose.degree_size_ratio {
            config.degree_size_ratio = parse_ratio(&value_text(value))?;
        }
        if let Some(value) = &loose.top_k {
            config.top_k = parse_top_k(&value_text(value))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.degree_size_ratio.is_finite() || self.degree_size_ratio <= 1.0 {
            return Err(ConfigError::InvalidRatio(self.degree_size_ratio.to_string()));
        }
        if self.top_k == 0 {
            return Err(ConfigError::InvalidTopK(self.top_k.to_string()));
        }
        Ok(())
    }
}

/// Config file contents before any value is checked.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct LooseConfig {
    threshold: Option<Value>,
    degree_size_ratio: Option<Value>,
    top_k: Option<Value>,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_threshold(raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidThreshold(raw.to_string()))
}

pub fn parse_ratio(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(ratio) if ratio.is_finite() && ratio > 1.0 => Ok(ratio),
        _ => Err(ConfigError::InvalidRatio(raw.to_string())),
    }
}

pub fn parse_top_k(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(k) if k > 0 => Ok(k),
        _ => Err(ConfigError::InvalidTopK(raw.to_string())),
    }
}
