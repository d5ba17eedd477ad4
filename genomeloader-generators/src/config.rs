use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{GeneratorError, GeneratorResult};
use crate::jitter::JitterMode;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

fn default_batch_size() -> usize {
    128
}

fn default_window_len() -> u32 {
    200
}

fn default_seq_len() -> u32 {
    1024
}

fn default_bedgraph_seq_len() -> Option<u32> {
    Some(1024)
}

fn default_negatives_ratio() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

///
/// Settings of a [crate::MultiBedGenerator], fixed for its lifetime.
///
/// Every field has a default, so a TOML file only needs the keys it overrides.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Window used for binary labels and for the sliding jitter margin.
    #[serde(default = "default_window_len")]
    pub window_len: u32,
    /// Length of every fetched input window.
    #[serde(default = "default_seq_len")]
    pub seq_len: u32,
    /// Length of per-position label windows; `seq_len` when unset.
    #[serde(default)]
    pub output_seq_len: Option<u32>,
    /// Negatives per positive. Integer only.
    #[serde(default = "default_negatives_ratio")]
    pub negatives_ratio: u32,
    #[serde(default)]
    pub return_sequences: bool,
    #[serde(default = "default_true")]
    pub return_output: bool,
    #[serde(default)]
    pub jitter_mode: JitterMode,
    #[serde(default = "default_true")]
    pub shuffle: bool,
    /// Seed for every random draw; OS entropy when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            batch_size: default_batch_size(),
            window_len: default_window_len(),
            seq_len: default_seq_len(),
            output_seq_len: None,
            negatives_ratio: default_negatives_ratio(),
            return_sequences: false,
            return_output: true,
            jitter_mode: JitterMode::default(),
            shuffle: true,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn output_seq_len(&self) -> u32 {
        self.output_seq_len.unwrap_or(self.seq_len)
    }

    pub fn validate(&self) -> GeneratorResult<()> {
        if self.batch_size == 0 {
            return Err(GeneratorError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.window_len == 0 {
            return Err(GeneratorError::InvalidConfig(
                "window_len must be positive integer".to_string(),
            ));
        }
        if self.seq_len <= self.window_len {
            return Err(GeneratorError::InvalidConfig(
                "seq_len must be > window_len".to_string(),
            ));
        }
        if self.output_seq_len == Some(0) {
            return Err(GeneratorError::InvalidConfig(
                "output_seq_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<&Path> for GeneratorConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}

///
/// Settings of a [crate::BedGraphGenerator].
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BedGraphConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fixed window centered on each row; each row's own span when unset.
    #[serde(default = "default_bedgraph_seq_len")]
    pub seq_len: Option<u32>,
    #[serde(default)]
    pub return_sequences: bool,
    #[serde(default = "default_true")]
    pub shuffle: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for BedGraphConfig {
    fn default() -> Self {
        BedGraphConfig {
            batch_size: default_batch_size(),
            seq_len: default_bedgraph_seq_len(),
            return_sequences: false,
            shuffle: true,
            seed: None,
        }
    }
}

impl BedGraphConfig {
    pub fn validate(&self) -> GeneratorResult<()> {
        if self.batch_size == 0 {
            return Err(GeneratorError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.seq_len == Some(0) {
            return Err(GeneratorError::InvalidConfig(
                "seq_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<&Path> for BedGraphConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}
