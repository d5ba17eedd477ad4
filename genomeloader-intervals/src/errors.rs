use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntervalSetError {
    #[error("Chromosome has no known size: {0}")]
    UnknownChromosome(String),

    #[error("Interval {chr}:{start}-{end} is longer than the largest chromosome")]
    IntervalTooLong { chr: String, start: u32, end: u32 },

    #[error("Cannot shuffle intervals into an empty genome")]
    EmptyGenome,

    #[error("Row has no numeric value column: {0}")]
    MissingValue(String),
}

pub type IntervalSetResult<T> = std::result::Result<T, IntervalSetError>;
