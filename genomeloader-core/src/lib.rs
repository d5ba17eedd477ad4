//! # genomeloader-core
//!
//! Shared models for the genomeloader workspace.
//!
//! - **`Region`** / **`RegionSet`**: BED-style rows and the ordered tables built from them.
//! - **`SequenceProvider`** / **`ChromSizeProvider`**: the contracts a genome or a
//!   per-base signal track must satisfy to be sliced by the batch generators.
//! - **`GenomeAssembly`**: an in-memory, one-hot encoded genome loaded from FASTA.
//!
//! ## Example
//!
//! ```rust
//! use genomeloader_core::models::{Region, RegionSet};
//!
//! let peaks = RegionSet::from(vec![Region {
//!     chr: "chr1".to_string(),
//!     start: 1000,
//!     end: 1100,
//!     rest: None,
//! }]);
//! assert_eq!(peaks.len(), 1);
//! ```
//!
pub mod errors;
pub mod models;
pub mod providers;
pub mod utils;

pub use errors::*;
pub use providers::*;
