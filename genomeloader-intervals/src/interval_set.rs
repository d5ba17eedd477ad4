use std::collections::{HashMap, HashSet};

use fxhash::FxHashMap;
use rand::Rng;

use genomeloader_core::models::{Region, RegionSet};

use crate::errors::{IntervalSetError, IntervalSetResult};
use crate::shuffle::{ShuffleOutcome, shuffle_regions};

/// Interval set operations needed for negative mining.
///
/// Modeled after bedtools: every operation returns a new set. Merging
/// operations (`union`, `reduce`, `setdiff`) drop the `rest` column since
/// merged rows have no single value to carry forward; row-preserving
/// operations (`concat`, `replicate`, `slop`, `shuffle`) keep it.
pub trait IntervalSet: Sized + Clone {
    /// Number of rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the chromosomes referenced by at least one row.
    fn chromosomes(&self) -> HashSet<String>;

    /// Rows of `self` followed by rows of `other`, nothing merged.
    fn concat(&self, other: &Self) -> Self;

    /// Merged union of `self` and `other`.
    fn union(&self, other: &Self) -> Self {
        self.concat(other).reduce()
    }

    /// Merge overlapping and adjacent intervals per chromosome.
    ///
    /// Sorts by (chr, start), then sweeps to merge intervals where
    /// `next.start <= current.end`.
    fn reduce(&self) -> Self;

    /// Remove the portions of `self` covered by `other`.
    ///
    /// # Example
    /// ```text
    /// A: chr1 100–200
    /// B: chr1 120–140, chr1 160–180
    /// setdiff(A, B): chr1 100–120, chr1 140–160, chr1 180–200
    /// ```
    fn setdiff(&self, other: &Self) -> Self;

    /// Grow every row by `by` bases on both sides, clipped to chromosome bounds.
    fn slop(&self, by: u32, chrom_sizes: &HashMap<String, u32>) -> IntervalSetResult<Self>;

    /// `n` copies of the rows, back to back.
    fn replicate(&self, n: usize) -> Self;

    /// Move every row to a random location of the same length.
    ///
    /// Placements respect chromosome bounds, never touch `exclusion`, and never
    /// overlap each other. Returns [ShuffleOutcome::Exhausted] when some row
    /// cannot be placed.
    fn shuffle<R: Rng + ?Sized>(
        &self,
        exclusion: &Self,
        chrom_sizes: &HashMap<String, u32>,
        rng: &mut R,
    ) -> IntervalSetResult<ShuffleOutcome<Self>>;
}

impl IntervalSet for RegionSet {
    fn len(&self) -> usize {
        self.regions.len()
    }

    fn chromosomes(&self) -> HashSet<String> {
        self.regions.iter().map(|r| r.chr.clone()).collect()
    }

    fn concat(&self, other: &RegionSet) -> RegionSet {
        let mut regions = Vec::with_capacity(self.len() + other.len());
        regions.extend_from_slice(&self.regions);
        regions.extend_from_slice(&other.regions);
        RegionSet::from(regions)
    }

    fn reduce(&self) -> RegionSet {
        if self.regions.is_empty() {
            return RegionSet::default();
        }

        let mut sorted = RegionSet::from(self.regions.clone());
        sorted.sort();
        let regions = &sorted.regions;

        let mut merged: Vec<Region> = Vec::new();
        let mut current = Region::new(&regions[0].chr, regions[0].start, regions[0].end);

        for r in &regions[1..] {
            if r.chr == current.chr && r.start <= current.end {
                current.end = current.end.max(r.end);
            } else {
                merged.push(current);
                current = Region::new(&r.chr, r.start, r.end);
            }
        }
        merged.push(current);

        RegionSet::from(merged)
    }

    fn setdiff(&self, other: &RegionSet) -> RegionSet {
        let a = self.reduce();
        let b = other.reduce();

        let mut b_by_chr: FxHashMap<&str, Vec<&Region>> = FxHashMap::default();
        for r in &b.regions {
            b_by_chr.entry(r.chr.as_str()).or_default().push(r);
        }

        let empty = vec![];
        let mut result: Vec<Region> = Vec::new();

        for a_region in &a.regions {
            let b_chr = b_by_chr.get(a_region.chr.as_str()).unwrap_or(&empty);
            // b is sorted and merged, so skip everything ending before this region
            let first = b_chr.partition_point(|r| r.end <= a_region.start);

            let mut pos = a_region.start;
            for b_region in &b_chr[first..] {
                if b_region.start >= a_region.end || pos >= a_region.end {
                    break;
                }
                if b_region.start > pos {
                    result.push(Region::new(&a_region.chr, pos, b_region.start));
                }
                pos = pos.max(b_region.end);
            }

            if pos < a_region.end {
                result.push(Region::new(&a_region.chr, pos, a_region.end));
            }
        }

        RegionSet::from(result)
    }

    fn slop(&self, by: u32, chrom_sizes: &HashMap<String, u32>) -> IntervalSetResult<RegionSet> {
        self.regions
            .iter()
            .map(|r| {
                let chrom_size = chrom_sizes
                    .get(&r.chr)
                    .ok_or_else(|| IntervalSetError::UnknownChromosome(r.chr.clone()))?;
                Ok(Region {
                    chr: r.chr.clone(),
                    start: r.start.saturating_sub(by),
                    end: r.end.saturating_add(by).min(*chrom_size),
                    rest: r.rest.clone(),
                })
            })
            .collect::<IntervalSetResult<Vec<Region>>>()
            .map(RegionSet::from)
    }

    fn replicate(&self, n: usize) -> RegionSet {
        let mut regions = Vec::with_capacity(self.len() * n);
        for _ in 0..n {
            regions.extend_from_slice(&self.regions);
        }
        RegionSet::from(regions)
    }

    fn shuffle<R: Rng + ?Sized>(
        &self,
        exclusion: &RegionSet,
        chrom_sizes: &HashMap<String, u32>,
        rng: &mut R,
    ) -> IntervalSetResult<ShuffleOutcome<RegionSet>> {
        shuffle_regions(self, exclusion, chrom_sizes, rng)
    }
}
