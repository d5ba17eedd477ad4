use std::collections::HashMap;

use log::{debug, warn};
use rand::Rng;

use genomeloader_core::models::RegionSet;
use genomeloader_intervals::{IntervalSet, ShuffleOutcome};

use crate::error::GeneratorResult;
use crate::jitter::JitterMode;

///
/// Background windows for one generator.
///
/// The pool starts as `negatives_ratio` copies of the positives and is moved
/// to fresh coordinates on every [NegativeSampler::refresh]. Coordinates used
/// by earlier pools join the exclusion region, so a sampling cycle never
/// revisits a spot. When no overlap-free placement is left the cycle starts
/// over from the base exclusion region.
///
#[derive(Debug, Clone)]
pub struct NegativeSampler {
    template: RegionSet,
    base_exclusion: RegionSet,
    chrom_sizes: HashMap<String, u32>,
    pool: RegionSet,
    exclusion: RegionSet,
    resets: usize,
}

impl NegativeSampler {
    ///
    /// # Arguments
    /// - positives: the master positive set, every chromosome present in `chrom_sizes`
    /// - blacklist: regions never used for negatives
    /// - negatives_ratio: copies of the positive set in the pool; 0 disables negatives
    /// - jitter_mode / window_len: under sliding jitter positives are padded by
    ///   `window_len / 2` before they are excluded
    /// - chrom_sizes: genome restricted to the chromosomes negatives may land on
    ///
    pub fn new(
        positives: &RegionSet,
        blacklist: Option<&RegionSet>,
        negatives_ratio: u32,
        jitter_mode: JitterMode,
        window_len: u32,
        chrom_sizes: HashMap<String, u32>,
    ) -> GeneratorResult<Self> {
        let template = match negatives_ratio {
            0 => RegionSet::default(),
            1 => positives.clone(),
            n => positives.replicate(n as usize),
        };

        let mut base_exclusion = match jitter_mode {
            JitterMode::Sliding => positives.slop(window_len / 2, &chrom_sizes)?,
            _ => positives.clone(),
        };
        if let Some(blacklist) = blacklist {
            base_exclusion = base_exclusion.union(blacklist);
        } else {
            base_exclusion = base_exclusion.reduce();
        }

        Ok(NegativeSampler {
            pool: template.clone(),
            exclusion: base_exclusion.clone(),
            template,
            base_exclusion,
            chrom_sizes,
            resets: 0,
        })
    }

    /// Most recently placed pool (the template before the first refresh).
    pub fn pool(&self) -> &RegionSet {
        &self.pool
    }

    /// Region the next placement must avoid.
    pub fn exclusion(&self) -> &RegionSet {
        &self.exclusion
    }

    /// Padded positives plus blacklist, the exclusion every cycle starts from.
    pub fn base_exclusion(&self) -> &RegionSet {
        &self.base_exclusion
    }

    /// Number of times the sampler ran out of room and started over.
    pub fn resets(&self) -> usize {
        self.resets
    }

    pub fn chrom_sizes(&self) -> &HashMap<String, u32> {
        &self.chrom_sizes
    }

    /// Drop the accumulated history.
    pub fn reset(&mut self) {
        self.restore();
        self.resets += 1;
    }

    fn restore(&mut self) {
        self.pool = self.template.clone();
        self.exclusion = self.base_exclusion.clone();
    }

    fn try_place<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GeneratorResult<bool> {
        self.exclusion = self.exclusion.union(&self.pool);
        match self.pool.shuffle(&self.exclusion, &self.chrom_sizes, rng)? {
            ShuffleOutcome::Placed(pool) => {
                self.pool = pool;
                Ok(true)
            }
            ShuffleOutcome::Exhausted => Ok(false),
        }
    }

    ///
    /// Move the pool to new coordinates and return it.
    ///
    /// Exhaustion is handled here: the sampler resets and tries once more from
    /// the base exclusion region. If even that fails the epoch gets no
    /// negatives. Only malformed input (unknown chromosomes, intervals longer
    /// than any chromosome) is returned as an error.
    ///
    pub fn refresh<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GeneratorResult<RegionSet> {
        if self.template.is_empty() {
            return Ok(RegionSet::default());
        }

        if self.try_place(rng)? {
            debug!(
                "Placed {} negatives, exclusion covers {} intervals",
                self.pool.len(),
                self.exclusion.len()
            );
            return Ok(self.pool.clone());
        }

        warn!("Cannot find any more negatives, resetting");
        self.reset();
        if self.try_place(rng)? {
            return Ok(self.pool.clone());
        }

        warn!(
            "No room for {} negatives even after reset; this epoch has none",
            self.template.len()
        );
        self.restore();
        Ok(RegionSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use genomeloader_core::models::Region;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::*;

    fn overlaps_any(region: &Region, set: &RegionSet) -> bool {
        set.regions
            .iter()
            .any(|r| r.overlaps(&region.chr, region.start, region.end))
    }

    fn chrom_sizes(size: u32) -> HashMap<String, u32> {
        HashMap::from([("chr1".to_string(), size)])
    }

    #[fixture]
    fn positives() -> RegionSet {
        RegionSet::from(vec![
            Region::new("chr1", 1000, 1100),
            Region::new("chr1", 5000, 5200),
        ])
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 2)]
    #[case(3, 6)]
    fn test_pool_size_follows_ratio(
        positives: RegionSet,
        #[case] ratio: u32,
        #[case] expected: usize,
    ) {
        let mut rng = StdRng::seed_from_u64(0);
        let mut sampler = NegativeSampler::new(
            &positives,
            None,
            ratio,
            JitterMode::None,
            200,
            chrom_sizes(100_000),
        )
        .unwrap();
        assert_eq!(sampler.refresh(&mut rng).unwrap().len(), expected);
    }

    #[rstest]
    fn test_sliding_pads_exclusion(positives: RegionSet) {
        let sampler = NegativeSampler::new(
            &positives,
            None,
            1,
            JitterMode::Sliding,
            200,
            chrom_sizes(100_000),
        )
        .unwrap();
        assert_eq!(
            sampler.base_exclusion().regions,
            vec![Region::new("chr1", 900, 1200), Region::new("chr1", 4900, 5300)]
        );
    }

    #[rstest]
    fn test_blacklist_joins_exclusion(positives: RegionSet) {
        let blacklist = RegionSet::from(vec![Region::new("chr1", 8000, 9000)]);
        let sampler = NegativeSampler::new(
            &positives,
            Some(&blacklist),
            1,
            JitterMode::Detection,
            200,
            chrom_sizes(100_000),
        )
        .unwrap();
        assert_eq!(sampler.base_exclusion().len(), 3);
        assert!(overlaps_any(&Region::new("chr1", 8500, 8501), sampler.base_exclusion()));
    }

    #[rstest]
    fn test_negatives_avoid_exclusion_and_history(positives: RegionSet) {
        let mut rng = StdRng::seed_from_u64(5);
        let blacklist = RegionSet::from(vec![Region::new("chr1", 20_000, 60_000)]);
        let mut sampler = NegativeSampler::new(
            &positives,
            Some(&blacklist),
            1,
            JitterMode::Sliding,
            200,
            chrom_sizes(100_000),
        )
        .unwrap();

        let mut history: Vec<Region> = Vec::new();
        for _ in 0..20 {
            let negatives = sampler.refresh(&mut rng).unwrap();
            assert_eq!(negatives.len(), 2);
            for r in &negatives.regions {
                assert!(!overlaps_any(r, sampler.base_exclusion()));
                assert!(!history.iter().any(|h| h.overlaps(&r.chr, r.start, r.end)));
            }
            history.extend(negatives.regions);
        }
        assert_eq!(sampler.resets(), 0);
    }

    #[rstest]
    fn test_exhaustion_resets_without_error() {
        let mut rng = StdRng::seed_from_u64(8);
        // 100bp positive in a 1000bp chromosome leaves room for at most 8 negatives
        let positives = RegionSet::from(vec![Region::new("chr1", 450, 550)]);
        let mut sampler =
            NegativeSampler::new(&positives, None, 1, JitterMode::None, 200, chrom_sizes(1_000))
                .unwrap();

        for _ in 0..30 {
            let negatives = sampler.refresh(&mut rng).unwrap();
            assert_eq!(negatives.len(), 1);
            assert!(!overlaps_any(&negatives.regions[0], &positives));
        }
        assert!(sampler.resets() > 0);
    }

    #[rstest]
    fn test_no_room_at_all_gives_empty_epoch() {
        let mut rng = StdRng::seed_from_u64(8);
        let positives = RegionSet::from(vec![Region::new("chr1", 0, 100)]);
        let blacklist = RegionSet::from(vec![Region::new("chr1", 100, 1_000)]);
        let mut sampler = NegativeSampler::new(
            &positives,
            Some(&blacklist),
            1,
            JitterMode::None,
            200,
            chrom_sizes(1_000),
        )
        .unwrap();

        assert!(sampler.refresh(&mut rng).unwrap().is_empty());
        assert_eq!(sampler.pool(), &positives);
        assert_eq!(sampler.exclusion(), sampler.base_exclusion());
        // one exhaustion, one reset
        assert_eq!(sampler.resets(), 1);

        assert!(sampler.refresh(&mut rng).unwrap().is_empty());
        assert_eq!(sampler.resets(), 2);
    }

    #[rstest]
    fn test_unknown_chromosome_is_fatal() {
        let mut rng = StdRng::seed_from_u64(8);
        let positives = RegionSet::from(vec![Region::new("chr9", 0, 100)]);
        let mut sampler =
            NegativeSampler::new(&positives, None, 1, JitterMode::None, 200, chrom_sizes(1_000))
                .unwrap();
        assert!(sampler.refresh(&mut rng).is_err());
    }
}
