//! # genomeloader-intervals
//!
//! The interval-set provider used by the batch generators.
//!
//! All operations use 0-based half-open coordinates (BED convention), are
//! strand-unaware, and return new sets instead of mutating their input.
//!
//! - **`IntervalSet`**: union, concatenation, reduce, setdiff, slop,
//!   replication and overlap-free shuffling with an exclusion region.
//! - **`ShuffleOutcome`**: shuffling either places every interval or reports
//!   that the free space is exhausted; exhaustion is a value, not an error.
//! - **`CoverageTrack`**: per-base lookup of a region set, used to build labels.
//!
pub mod coverage;
pub mod errors;
pub mod interval_set;
pub mod shuffle;

pub use coverage::CoverageTrack;
pub use errors::*;
pub use interval_set::*;
pub use shuffle::{MAX_PLACEMENT_TRIES, ShuffleOutcome};
