use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::cdf::{GROUP, MAX_LEVEL};

/// Register width requested for the vector classifier.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WidthPreference {
    /// Pick the widest backend the host supports natively.
    #[default]
    Auto,
    /// 8-byte register pipeline with the scalar overflow pre-check.
    Narrow,
    /// 16-byte register pipeline with the injected final boundary.
    Wide,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings for the throughput benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchConfig {
    /// CDF words per batch (multiple of 8).
    pub batch_len: usize,
    /// Timed invocations per variant.
    pub iterations: u64,
    /// Sample classified against every word.
    pub sample: u8,
    /// RNG seed; `None` seeds from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            batch_len: 64,
            iterations: 1 << 20,
            sample: 6,
            seed: None,
        }
    }
}

impl BenchConfig {
    /// Check the constraints the benchmark relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_len == 0 || !self.batch_len.is_multiple_of(GROUP) {
            return Err(ConfigError::Invalid {
                key: "benchmark.batch_len",
                reason: format!("{} is not a non-zero multiple of {}", self.batch_len, GROUP),
            });
        }
        if self.iterations == 0 {
            return Err(ConfigError::Invalid {
                key: "benchmark.iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.sample > MAX_LEVEL {
            return Err(ConfigError::Invalid {
                key: "benchmark.sample",
                reason: format!("{} exceeds {}", self.sample, MAX_LEVEL),
            });
        }
        Ok(())
    }
}

/// Settings for vector backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VectorConfig {
    pub width: WidthPreference,
}

/// Effective configuration after all layers are merged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Config {
    pub benchmark: BenchConfig,
    pub vector: VectorConfig,
}

/// One TOML file. Every key is optional so a layer overrides only what it sets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub benchmark: BenchmarkLayer,
    #[serde(default)]
    pub vector: VectorLayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkLayer {
    pub batch_len: Option<usize>,
    pub iterations: Option<u64>,
    pub sample: Option<u8>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorLayer {
    pub width: Option<WidthPreference>,
}

impl ConfigLayer {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }
}

impl Config {
    /// Built-in defaults embedded from `nibble-cdf.toml`.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.merge(ConfigLayer::from_toml(include_str!("../../nibble-cdf.toml"))?);
        config.benchmark.validate()?;
        Ok(config)
    }

    /// Load configuration with user overrides from standard locations.
    ///
    /// 1. Start with the built-in defaults
    /// 2. Override with ~/.config/nibble-cdf/config.toml if it exists
    /// 3. Override with ./nibble-cdf.toml if it exists
    /// 4. Override with `explicit`, which must exist when given
    ///
    /// Broken optional files are skipped with a warning; a broken explicit
    /// file is an error.
    pub fn load_with_overrides(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load_default()?;

        if let Some(config_dir) = dirs::config_dir() {
            let user_config_path = config_dir.join("nibble-cdf").join("config.toml");
            config.merge_optional(&user_config_path);
        }

        config.merge_optional(Path::new("nibble-cdf.toml"));

        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading explicit config");
            config.merge(ConfigLayer::load_from_file(path)?);
        }

        config.benchmark.validate()?;
        Ok(config)
    }

    fn merge_optional(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match ConfigLayer::load_from_file(path) {
            Ok(layer) => {
                debug!(path = %path.display(), "merging config layer");
                self.merge(layer);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            }
        }
    }

    /// Apply every key set in `layer`.
    pub fn merge(&mut self, layer: ConfigLayer) {
        let b = layer.benchmark;
        if let Some(batch_len) = b.batch_len {
            self.benchmark.batch_len = batch_len;
        }
        if let Some(iterations) = b.iterations {
            self.benchmark.iterations = iterations;
        }
        if let Some(sample) = b.sample {
            self.benchmark.sample = sample;
        }
        if b.seed.is_some() {
            self.benchmark.seed = b.seed;
        }
        if let Some(width) = layer.vector.width {
            self.vector.width = width;
        }
    }

    /// Render as TOML for display.
    pub fn to_toml(&self) -> String {
        // Plain structs of integers and unit enums always serialize.
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
