#[cfg(feature = "core")]
#[doc(inline)]
pub use genomeloader_core as core;

#[cfg(feature = "intervals")]
#[doc(inline)]
pub use genomeloader_intervals as intervals;

#[cfg(feature = "generators")]
#[doc(inline)]
pub use genomeloader_generators as generators;
