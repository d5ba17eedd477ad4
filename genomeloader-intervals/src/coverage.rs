use anyhow::Result;
use fxhash::FxHashMap;
use ndarray::Array2;

use genomeloader_core::SequenceProvider;
use genomeloader_core::models::RegionSet;

use crate::errors::{IntervalSetError, IntervalSetResult};

#[derive(Debug, Default, Clone)]
struct ChromRows {
    // (start, end, value) sorted by start
    rows: Vec<(u32, u32, f32)>,
    max_width: u32,
}

///
/// Per-base view of a region set.
///
/// A binary track reports 1.0 on every covered base; a value track reports
/// the value column of the covering row. Uncovered bases and bases outside
/// the chromosome report 0.0. Where rows overlap the largest covering value
/// wins, negative values included.
///
#[derive(Debug, Default, Clone)]
pub struct CoverageTrack {
    by_chr: FxHashMap<String, ChromRows>,
}

impl CoverageTrack {
    fn from_rows<I: IntoIterator<Item = (String, u32, u32, f32)>>(rows: I) -> Self {
        let mut by_chr: FxHashMap<String, ChromRows> = FxHashMap::default();
        for (chr, start, end, value) in rows {
            let entry = by_chr.entry(chr).or_default();
            entry.rows.push((start, end, value));
            entry.max_width = entry.max_width.max(end - start);
        }
        for chrom_rows in by_chr.values_mut() {
            chrom_rows.rows.sort_by_key(|&(start, end, _)| (start, end));
        }
        CoverageTrack { by_chr }
    }

    /// Presence track of a BED file. Extra columns are ignored.
    pub fn binary(region_set: &RegionSet) -> Self {
        Self::from_rows(
            region_set
                .regions
                .iter()
                .map(|r| (r.chr.clone(), r.start, r.end, 1.0)),
        )
    }

    /// Signal track of a bedGraph file. Every row must carry a numeric value.
    pub fn values(region_set: &RegionSet) -> IntervalSetResult<Self> {
        let rows = region_set
            .regions
            .iter()
            .map(|r| {
                r.value()
                    .map(|value| (r.chr.clone(), r.start, r.end, value))
                    .ok_or_else(|| IntervalSetError::MissingValue(r.as_string()))
            })
            .collect::<IntervalSetResult<Vec<_>>>()?;
        Ok(Self::from_rows(rows))
    }

    /// Sum of the per-base values over `[start, end)`.
    pub fn sum(&self, chrom: &str, start: i64, end: i64) -> f32 {
        self.per_base(chrom, start, end).iter().sum()
    }

    fn per_base(&self, chrom: &str, start: i64, end: i64) -> Vec<f32> {
        let len = (end - start).max(0) as usize;
        let mut covered: Vec<Option<f32>> = vec![None; len];

        if let Some(chrom_rows) = self.by_chr.get(chrom) {
            // rows starting before `start - max_width` cannot reach the window
            let lower = start - chrom_rows.max_width as i64;
            let first = chrom_rows
                .rows
                .partition_point(|&(s, _, _)| (s as i64) < lower);

            for &(s, e, value) in &chrom_rows.rows[first..] {
                let (s, e) = (s as i64, e as i64);
                if s >= end {
                    break;
                }
                for pos in s.max(start)..e.min(end) {
                    let slot = &mut covered[(pos - start) as usize];
                    *slot = Some(slot.map_or(value, |current| current.max(value)));
                }
            }
        }

        covered.into_iter().map(|v| v.unwrap_or(0.0)).collect()
    }
}

impl SequenceProvider for CoverageTrack {
    fn fetch(&self, chrom: &str, start: i64, end: i64) -> Result<Array2<f32>> {
        let values = self.per_base(chrom, start, end);
        let len = values.len();
        Ok(Array2::from_shape_vec((len, 1), values)?)
    }

    fn n_features(&self) -> usize {
        1
    }
}
