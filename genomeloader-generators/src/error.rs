use thiserror::Error;

use genomeloader_intervals::IntervalSetError;

use super::config::ConfigError;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Batch index {index} out of bounds for {len} batches")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("Chromosome not found in genome: {0}")]
    UnknownChromosome(String),
    #[error("Provider returned {got} positions for {chrom}:{start}-{end}")]
    FetchLength {
        chrom: String,
        start: i64,
        end: i64,
        got: usize,
    },
    #[error("Provider returned {got} features for {chrom}, declared {expected}")]
    FetchWidth {
        chrom: String,
        expected: usize,
        got: usize,
    },
    #[error("Interval has no numeric value column: {0}")]
    MissingValue(String),
    #[error(transparent)]
    Interval(#[from] IntervalSetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Fetch(#[from] anyhow::Error),
}

pub type GeneratorResult<T> = std::result::Result<T, GeneratorError>;
