use crate::bio::marker::{validate_pattern, MatchParams};
use crate::bio::trimming::{DEFAULT_THRESHOLD, DEFAULT_WINDOW_WIDTH, FORWARD_PRIMER_OFFSET};
use crate::{AmpliclusterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trimming: TrimmingConfig,
    pub marker: MarkerConfig,
    pub batch: BatchConfig,
    pub clustering: ClusteringConfig,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimmingConfig {
    /// Smoothed error probability a base must stay below
    pub threshold: f64,
    pub window_width: usize,
    /// Trim regions start no earlier than this 1-based position
    pub primer_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Concrete nucleotide pattern; required for annotation
    pub pattern: Option<String>,
    pub max_mismatches: usize,
    pub allow_indels: bool,
    pub subject_ambiguity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub silent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub min_length: usize,
    /// Largest fractional distance to a representative that still joins its cluster
    pub identity_cutoff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Worker threads, 0 = all cores
    pub threads: usize,
}

impl Default for TrimmingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            window_width: DEFAULT_WINDOW_WIDTH,
            primer_offset: FORWARD_PRIMER_OFFSET,
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        let params = MatchParams::default();
        Self {
            pattern: None,
            max_mismatches: params.max_mismatches,
            allow_indels: params.allow_indels,
            subject_ambiguity: params.subject_ambiguity,
        }
    }
}

impl MarkerConfig {
    pub fn params(&self) -> MatchParams {
        MatchParams {
            max_mismatches: self.max_mismatches,
            allow_indels: self.allow_indels,
            subject_ambiguity: self.subject_ambiguity,
        }
    }

    /// The configured pattern, or a configuration error when none is set.
    pub fn require_pattern(&self) -> Result<&str> {
        self.pattern
            .as_deref()
            .ok_or_else(|| AmpliclusterError::Config("no marker pattern configured".to_string()))
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            silent: false,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_length: 100,
            identity_cutoff: 0.03,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { threads: 0 }
    }
}

impl Config {
    /// Rejects values no run could use.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(AmpliclusterError::Config(msg)) };

        let t = &self.trimming;
        if !(t.threshold.is_finite() && t.threshold > 0.0) {
            return invalid(format!("trimming.threshold must be positive, got {}", t.threshold));
        }
        if t.window_width == 0 {
            return invalid("trimming.window_width must be positive".to_string());
        }
        if self.batch.batch_size == 0 {
            return invalid("batch.batch_size must be positive".to_string());
        }
        let cutoff = self.clustering.identity_cutoff;
        if !(0.0..=1.0).contains(&cutoff) {
            return invalid(format!("clustering.identity_cutoff must be in [0, 1], got {}", cutoff));
        }
        if let Some(pattern) = &self.marker.pattern {
            validate_pattern(pattern.as_bytes())
                .map_err(|e| AmpliclusterError::Config(format!("marker.pattern: {}", e)))?;
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| AmpliclusterError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let contents = to_toml(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn to_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| AmpliclusterError::Config(format!("Failed to serialize config: {}", e)))
}
