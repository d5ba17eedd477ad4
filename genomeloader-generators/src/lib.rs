//! # genomeloader-generators
//!
//! Randomized, epoch-shuffled training batches of (sequence window, label)
//! pairs drawn from genomic intervals.
//!
//! ## Main Components
//!
//! - **`MultiBedGenerator`**: positives from one or more BED label sources,
//!   negatives re-mined from the background every epoch, jittered windows,
//!   binary or per-position labels.
//! - **`BedGraphGenerator`**: windows around the rows of a single bedGraph
//!   track, labelled with the row values.
//! - **`NegativeSampler`**: the background pool and its cumulative exclusion
//!   region, reset when the genome runs out of room.
//!
//! Both generators are driven the same way: call `on_epoch_end()` between
//! epochs and pull batches by index with `get_batch(i)` for `i < len()`.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use genomeloader_core::models::{GenomeAssembly, Region, RegionSet};
//! use genomeloader_generators::{GeneratorConfig, JitterMode, MultiBedGenerator};
//!
//! let genome = GenomeAssembly::from(HashMap::from([(
//!     "chr1".to_string(),
//!     b"ACGT".repeat(2_000),
//! )]));
//! let peaks = RegionSet::from(vec![Region::new("chr1", 1000, 1100)]);
//! let config = GeneratorConfig {
//!     batch_size: 1,
//!     jitter_mode: JitterMode::None,
//!     seed: Some(0),
//!     ..Default::default()
//! };
//!
//! let mut generator = MultiBedGenerator::builder(genome)
//!     .bed(peaks)
//!     .config(config)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(generator.len(), 2);
//! let batch = generator.get_batch(0).unwrap();
//! assert_eq!(batch.inputs.genome().dim(), (1, 1024, 4));
//! ```
//!
pub mod batch;
pub mod bedgraph;
pub mod config;
pub mod error;
pub mod jitter;
pub mod multi_bed;
pub mod negatives;

// re-export things
pub use batch::*;
pub use bedgraph::*;
pub use config::*;
pub use error::*;
pub use jitter::JitterMode;
pub use multi_bed::*;
pub use negatives::NegativeSampler;
