use std::collections::HashMap;

use log::{debug, info};
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use genomeloader_core::models::{Region, RegionSet};
use genomeloader_core::{ChromSizeProvider, SequenceProvider};
use genomeloader_intervals::{CoverageTrack, IntervalSet};

use crate::batch::{
    Batch, BatchLabels, InputCollector, concat_features, fetch_window, stack_samples,
};
use crate::config::GeneratorConfig;
use crate::error::{GeneratorError, GeneratorResult};
use crate::jitter::centered_window;
use crate::negatives::NegativeSampler;

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

///
/// Batches of jittered genome windows around positive intervals and freshly
/// mined background negatives.
///
/// The interval table of an epoch is the master positive set followed by the
/// negative pool, permuted when `shuffle` is on. It is rebuilt by
/// [MultiBedGenerator::on_epoch_end] and read by [MultiBedGenerator::get_batch].
///
pub struct MultiBedGenerator<G> {
    config: GeneratorConfig,
    beds: Vec<CoverageTrack>,
    master: RegionSet,
    genome: G,
    signals: Vec<Box<dyn SequenceProvider>>,
    sampler: NegativeSampler,
    intervals: RegionSet,
    epoch: Option<usize>,
    rng: StdRng,
}

pub struct MultiBedGeneratorBuilder<G> {
    genome: G,
    beds: Vec<RegionSet>,
    signals: Vec<Box<dyn SequenceProvider>>,
    blacklist: Option<RegionSet>,
    extra: Option<RegionSet>,
    config: GeneratorConfig,
}

impl<G: SequenceProvider + ChromSizeProvider> MultiBedGeneratorBuilder<G> {
    pub fn new(genome: G) -> Self {
        MultiBedGeneratorBuilder {
            genome,
            beds: Vec::new(),
            signals: Vec::new(),
            blacklist: None,
            extra: None,
            config: GeneratorConfig::default(),
        }
    }

    /// Add a label source. Its rows are positives and it gets one label column.
    pub fn bed(mut self, bed: RegionSet) -> Self {
        self.beds.push(bed);
        self
    }

    pub fn beds<I: IntoIterator<Item = RegionSet>>(mut self, beds: I) -> Self {
        self.beds.extend(beds);
        self
    }

    /// Add a signal track fetched over the same windows as the genome.
    pub fn signal<S: SequenceProvider + 'static>(mut self, signal: S) -> Self {
        self.signals.push(Box::new(signal));
        self
    }

    /// Regions negatives must never overlap.
    pub fn blacklist(mut self, blacklist: RegionSet) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    /// Extra positives: sampled and excluded from negatives, but not labelled.
    pub fn extra(mut self, extra: RegionSet) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    ///
    /// Validate the configuration, mine the first negative pool and build the
    /// epoch 0 interval table.
    ///
    pub fn build(self) -> GeneratorResult<MultiBedGenerator<G>> {
        self.config.validate()?;
        if self.beds.is_empty() {
            return Err(GeneratorError::InvalidConfig(
                "at least one bed label source is required".to_string(),
            ));
        }

        let master = match (self.beds.as_slice(), &self.extra) {
            ([bed], None) => bed.clone(),
            (beds, extra) => beds
                .iter()
                .chain(extra.iter())
                .fold(RegionSet::default(), |acc, bed| acc.concat(bed))
                .reduce(),
        };

        let genome_sizes = self.genome.chrom_sizes();
        let mut chrom_sizes: HashMap<String, u32> = HashMap::new();
        for chrom in master.chromosomes() {
            let size = genome_sizes
                .get(&chrom)
                .ok_or_else(|| GeneratorError::UnknownChromosome(chrom.clone()))?;
            chrom_sizes.insert(chrom, *size);
        }

        let sampler = NegativeSampler::new(
            &master,
            self.blacklist.as_ref(),
            self.config.negatives_ratio,
            self.config.jitter_mode,
            self.config.window_len,
            chrom_sizes,
        )?;

        info!(
            "Sampling from {} positives on {} chromosomes, {} negatives per epoch",
            master.len(),
            sampler.chrom_sizes().len(),
            master.len() * self.config.negatives_ratio as usize
        );

        let mut generator = MultiBedGenerator {
            beds: self.beds.iter().map(CoverageTrack::binary).collect(),
            master,
            genome: self.genome,
            signals: self.signals,
            sampler,
            intervals: RegionSet::default(),
            epoch: None,
            rng: seeded_rng(self.config.seed),
            config: self.config,
        };
        generator.on_epoch_end()?;

        Ok(generator)
    }
}

impl<G: SequenceProvider + ChromSizeProvider> MultiBedGenerator<G> {
    pub fn builder(genome: G) -> MultiBedGeneratorBuilder<G> {
        MultiBedGeneratorBuilder::new(genome)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Merged positives: every label source plus the extra set.
    pub fn master(&self) -> &RegionSet {
        &self.master
    }

    pub fn sampler(&self) -> &NegativeSampler {
        &self.sampler
    }

    /// Interval table of the current epoch.
    pub fn intervals(&self) -> &RegionSet {
        &self.intervals
    }

    /// Current epoch number; 0 right after construction.
    pub fn epoch(&self) -> Option<usize> {
        self.epoch
    }

    /// Number of batches in the current epoch.
    pub fn len(&self) -> usize {
        self.intervals.len().div_ceil(self.config.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    ///
    /// Advance to the next epoch.
    ///
    /// With `shuffle` off the table of epoch 0 is kept for good. Otherwise a new
    /// negative pool is mined, appended to the positives, and the whole table
    /// is permuted.
    ///
    pub fn on_epoch_end(&mut self) -> GeneratorResult<()> {
        let epoch = self.epoch.map_or(0, |epoch| epoch + 1);
        self.epoch = Some(epoch);
        if !self.config.shuffle && epoch > 0 {
            return Ok(());
        }

        let negatives = self.sampler.refresh(&mut self.rng)?;
        let mut table = self.master.concat(&negatives);
        if self.config.shuffle {
            table.regions.shuffle(&mut self.rng);
        }

        debug!(
            "Epoch {}: {} positives, {} negatives",
            epoch,
            self.master.len(),
            negatives.len()
        );
        self.intervals = table;

        Ok(())
    }

    ///
    /// Assemble batch `index` of the current epoch.
    ///
    /// Every row gets one jittered midpoint; the `seq_len` input window, the
    /// `window_len` binary label window and the `output_seq_len` label window
    /// are all centered on it.
    ///
    pub fn get_batch(&mut self, index: usize) -> GeneratorResult<Batch> {
        let len = self.len();
        if index >= len {
            return Err(GeneratorError::IndexOutOfBounds { index, len });
        }

        let start = index * self.config.batch_size;
        let end = (start + self.config.batch_size).min(self.intervals.len());
        let rows = self.intervals.slice(start, end);

        let jitter_mode = self.config.jitter_mode;
        let window_len = self.config.window_len;
        let output_seq_len = self.config.output_seq_len();
        let mids: Vec<i64> = rows
            .iter()
            .map(|r| jitter_mode.jittered_mid_x2(r, window_len, output_seq_len, &mut self.rng))
            .collect();

        let mut collector = InputCollector::new(&self.signals, rows.len());
        for (r, &mid_x2) in rows.iter().zip(&mids) {
            let (window_start, window_end) = centered_window(mid_x2, self.config.seq_len);
            collector.push(&self.genome, &r.chr, window_start, window_end)?;
        }
        let inputs = collector.finish()?;

        let labels = if self.config.return_output {
            Some(self.labels(rows, &mids)?)
        } else {
            None
        };

        Ok(Batch { inputs, labels })
    }

    fn labels(&self, rows: &[Region], mids: &[i64]) -> GeneratorResult<BatchLabels> {
        if self.config.return_sequences {
            let output_seq_len = self.config.output_seq_len();
            let mut samples = Vec::with_capacity(rows.len());
            for (r, &mid_x2) in rows.iter().zip(mids) {
                let (start, end) = centered_window(mid_x2, output_seq_len);
                let parts = self
                    .beds
                    .iter()
                    .map(|bed| fetch_window(bed, &r.chr, start, end))
                    .collect::<GeneratorResult<Vec<_>>>()?;
                samples.push(concat_features(&parts)?);
            }
            return Ok(BatchLabels::Sequence(stack_samples(&samples)?));
        }

        let window_len = self.config.window_len;
        let mut flags = Vec::with_capacity(rows.len() * self.beds.len());
        for (r, &mid_x2) in rows.iter().zip(mids) {
            let (start, end) = centered_window(mid_x2, window_len);
            for bed in &self.beds {
                // majority of the label window covered
                flags.push(2.0 * bed.sum(&r.chr, start, end) >= window_len as f32);
            }
        }
        Ok(BatchLabels::Binary(Array2::from_shape_vec(
            (rows.len(), self.beds.len()),
            flags,
        )?))
    }

    /// Every batch of the current epoch, in order.
    pub fn iter_batches(&mut self) -> impl Iterator<Item = GeneratorResult<Batch>> + '_ {
        let len = self.len();
        (0..len).map(move |index| self.get_batch(index))
    }
}
