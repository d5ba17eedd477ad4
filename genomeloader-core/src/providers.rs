use std::collections::HashMap;

use anyhow::Result;
use ndarray::Array2;

///
/// Random access to a per-base numeric track: a one-hot genome, a coverage
/// track, a signal track.
///
/// `fetch` must return exactly `end - start` rows for any `start < end`,
/// including windows that hang off either chromosome end. How those positions
/// are filled (zero padding, clipping, repeat) is the implementor's choice;
/// callers never clip coordinates themselves.
///
pub trait SequenceProvider {
    fn fetch(&self, chrom: &str, start: i64, end: i64) -> Result<Array2<f32>>;

    /// Number of columns in every array returned by `fetch`.
    fn n_features(&self) -> usize;
}

///
/// Source of chromosome lengths.
///
pub trait ChromSizeProvider {
    fn chrom_sizes(&self) -> HashMap<String, u32>;
}

impl<T: SequenceProvider + ?Sized> SequenceProvider for Box<T> {
    fn fetch(&self, chrom: &str, start: i64, end: i64) -> Result<Array2<f32>> {
        (**self).fetch(chrom, start, end)
    }

    fn n_features(&self) -> usize {
        (**self).n_features()
    }
}

impl ChromSizeProvider for HashMap<String, u32> {
    fn chrom_sizes(&self) -> HashMap<String, u32> {
        self.clone()
    }
}
