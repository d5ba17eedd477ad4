use std::collections::{BTreeMap, HashMap};

use fxhash::FxHashMap;
use rand::Rng;

use genomeloader_core::models::{Region, RegionSet};

use crate::errors::{IntervalSetError, IntervalSetResult};
use crate::interval_set::IntervalSet;

/// Random draws attempted per interval before giving up (bedtools' `-maxTries`).
pub const MAX_PLACEMENT_TRIES: usize = 1000;

/// Result of an overlap-free shuffle.
#[derive(Debug, Clone, PartialEq)]
pub enum ShuffleOutcome<S> {
    /// Every interval found a valid home.
    Placed(S),
    /// Some interval could not be placed within [MAX_PLACEMENT_TRIES] draws.
    Exhausted,
}

impl<S> ShuffleOutcome<S> {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ShuffleOutcome::Exhausted)
    }
}

/// The genome as one concatenated coordinate line, chromosomes in name order
/// so that a seeded rng always maps to the same placements.
struct GenomeLine<'a> {
    chroms: Vec<(&'a str, u32)>,
    cumulative: Vec<u64>,
    total_size: u64,
}

impl<'a> GenomeLine<'a> {
    fn new(chrom_sizes: &'a HashMap<String, u32>) -> Self {
        let mut chroms: Vec<(&str, u32)> = chrom_sizes
            .iter()
            .map(|(chr, size)| (chr.as_str(), *size))
            .collect();
        chroms.sort();

        let mut cumulative = Vec::with_capacity(chroms.len());
        let mut running_total = 0u64;
        for (_, size) in &chroms {
            running_total += *size as u64;
            cumulative.push(running_total);
        }

        GenomeLine {
            chroms,
            cumulative,
            total_size: running_total,
        }
    }

    /// Draw a base uniformly over the genome; returns (chrom, size, offset).
    #[inline]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (&'a str, u32, u32) {
        let target = rng.random_range(0..self.total_size);
        let idx = self.cumulative.partition_point(|&x| x <= target);
        let (chr, size) = self.chroms[idx];
        let chrom_start = self.cumulative[idx] - size as u64;
        (chr, size, (target - chrom_start) as u32)
    }

    fn max_chrom_size(&self) -> u32 {
        self.chroms.iter().map(|(_, size)| *size).max().unwrap_or(0)
    }
}

/// Sorted, merged intervals per chromosome for overlap queries.
#[derive(Default)]
struct ExclusionIndex {
    by_chr: FxHashMap<String, Vec<(u32, u32)>>,
}

impl ExclusionIndex {
    fn new(exclusion: &RegionSet) -> Self {
        let mut by_chr: FxHashMap<String, Vec<(u32, u32)>> = FxHashMap::default();
        for r in &exclusion.reduce().regions {
            by_chr.entry(r.chr.clone()).or_default().push((r.start, r.end));
        }
        ExclusionIndex { by_chr }
    }

    #[inline]
    fn overlaps(&self, chr: &str, start: u32, end: u32) -> bool {
        let Some(intervals) = self.by_chr.get(chr) else {
            return false;
        };
        // last interval starting before `end` is the only candidate once merged
        let idx = intervals.partition_point(|&(s, _)| s < end);
        idx > 0 && intervals[idx - 1].1 > start
    }
}

/// Intervals placed so far in one shuffle, never overlapping each other.
#[derive(Default)]
struct PlacedIndex<'a> {
    by_chr: FxHashMap<&'a str, BTreeMap<u32, u32>>,
}

impl<'a> PlacedIndex<'a> {
    #[inline]
    fn overlaps(&self, chr: &str, start: u32, end: u32) -> bool {
        self.by_chr
            .get(chr)
            .and_then(|placed| placed.range(..end).next_back())
            .is_some_and(|(_, &placed_end)| placed_end > start)
    }

    fn insert(&mut self, chr: &'a str, start: u32, end: u32) {
        self.by_chr.entry(chr).or_default().insert(start, end);
    }
}

///
/// Place every region of `regions` at a random, non-overlapping location that
/// avoids `exclusion` and stays within `chrom_sizes`.
///
/// Output rows keep the input order, widths and `rest` columns.
///
pub(crate) fn shuffle_regions<R: Rng + ?Sized>(
    regions: &RegionSet,
    exclusion: &RegionSet,
    chrom_sizes: &HashMap<String, u32>,
    rng: &mut R,
) -> IntervalSetResult<ShuffleOutcome<RegionSet>> {
    if regions.is_empty() {
        return Ok(ShuffleOutcome::Placed(RegionSet::default()));
    }

    let genome = GenomeLine::new(chrom_sizes);
    if genome.total_size == 0 {
        return Err(IntervalSetError::EmptyGenome);
    }
    let max_chrom_size = genome.max_chrom_size();

    for r in &regions.regions {
        if !chrom_sizes.contains_key(&r.chr) {
            return Err(IntervalSetError::UnknownChromosome(r.chr.clone()));
        }
        if r.width() > max_chrom_size {
            return Err(IntervalSetError::IntervalTooLong {
                chr: r.chr.clone(),
                start: r.start,
                end: r.end,
            });
        }
    }

    let excluded = ExclusionIndex::new(exclusion);
    let mut placed = PlacedIndex::default();
    let mut shuffled: Vec<Region> = Vec::with_capacity(regions.len());

    for r in &regions.regions {
        let width = r.width();
        let mut placement = None;

        for _ in 0..MAX_PLACEMENT_TRIES {
            let (chr, size, start) = genome.sample(rng);
            let Some(end) = start.checked_add(width).filter(|&end| end <= size) else {
                continue;
            };
            if excluded.overlaps(chr, start, end) || placed.overlaps(chr, start, end) {
                continue;
            }
            placement = Some((chr, start, end));
            break;
        }

        let Some((chr, start, end)) = placement else {
            return Ok(ShuffleOutcome::Exhausted);
        };
        placed.insert(chr, start, end);
        shuffled.push(Region {
            chr: chr.to_string(),
            start,
            end,
            rest: r.rest.clone(),
        });
    }

    Ok(ShuffleOutcome::Placed(RegionSet::from(shuffled)))
}
