use log::{debug, info};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use genomeloader_core::SequenceProvider;
use genomeloader_core::models::{Region, RegionSet};
use genomeloader_intervals::CoverageTrack;

use crate::batch::{Batch, BatchLabels, InputCollector, fetch_window, stack_samples};
use crate::config::BedGraphConfig;
use crate::error::{GeneratorError, GeneratorResult};
use crate::jitter::centered_window;
use crate::multi_bed::seeded_rng;

///
/// Batches of genome windows around the rows of one bedGraph track, labelled
/// with the row values. No negatives, no jitter.
///
pub struct BedGraphGenerator<G> {
    config: BedGraphConfig,
    track: CoverageTrack,
    genome: G,
    signals: Vec<Box<dyn SequenceProvider>>,
    intervals: RegionSet,
    epoch: Option<usize>,
    rng: StdRng,
}

impl<G: SequenceProvider> BedGraphGenerator<G> {
    ///
    /// # Arguments
    /// - bedgraph: rows with a numeric value in the first extra column
    /// - genome: one-hot sequence source
    /// - signals: extra tracks fetched over the same windows as the genome
    /// - config: generator settings
    ///
    pub fn new(
        bedgraph: RegionSet,
        genome: G,
        signals: Vec<Box<dyn SequenceProvider>>,
        config: BedGraphConfig,
    ) -> GeneratorResult<Self> {
        config.validate()?;
        if let Some(row) = bedgraph.regions.iter().find(|r| r.value().is_none()) {
            return Err(GeneratorError::MissingValue(row.as_string()));
        }
        let track = CoverageTrack::values(&bedgraph)?;

        info!(
            "Sampling {} bedGraph rows with {} signal tracks",
            bedgraph.len(),
            signals.len()
        );

        let mut generator = BedGraphGenerator {
            track,
            genome,
            signals,
            intervals: bedgraph,
            epoch: None,
            rng: seeded_rng(config.seed),
            config,
        };
        generator.on_epoch_end();

        Ok(generator)
    }

    pub fn config(&self) -> &BedGraphConfig {
        &self.config
    }

    /// Rows in the order of the current epoch.
    pub fn intervals(&self) -> &RegionSet {
        &self.intervals
    }

    pub fn epoch(&self) -> Option<usize> {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.intervals.len().div_ceil(self.config.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reorder the rows when `shuffle` is on; every epoch, not only the first.
    pub fn on_epoch_end(&mut self) {
        let epoch = self.epoch.map_or(0, |epoch| epoch + 1);
        self.epoch = Some(epoch);
        if self.config.shuffle {
            self.intervals.regions.shuffle(&mut self.rng);
            debug!("Epoch {}: reshuffled {} rows", epoch, self.intervals.len());
        }
    }

    fn window(&self, region: &Region) -> (i64, i64) {
        match self.config.seq_len {
            Some(seq_len) => centered_window(region.mid_point_x2(), seq_len),
            None => (region.start as i64, region.end as i64),
        }
    }

    ///
    /// Assemble batch `index` of the current epoch.
    ///
    /// Without a fixed `seq_len` every window is its row's own span, so rows of
    /// different widths in one batch cannot be stacked and yield a shape error.
    ///
    pub fn get_batch(&self, index: usize) -> GeneratorResult<Batch> {
        let len = self.len();
        if index >= len {
            return Err(GeneratorError::IndexOutOfBounds { index, len });
        }

        let start = index * self.config.batch_size;
        let end = (start + self.config.batch_size).min(self.intervals.len());
        let rows = self.intervals.slice(start, end);
        let windows: Vec<(i64, i64)> = rows.iter().map(|r| self.window(r)).collect();

        let mut collector = InputCollector::new(&self.signals, rows.len());
        for (r, &(window_start, window_end)) in rows.iter().zip(&windows) {
            collector.push(&self.genome, &r.chr, window_start, window_end)?;
        }
        let inputs = collector.finish()?;

        let labels = if self.config.return_sequences {
            let samples = rows
                .iter()
                .zip(&windows)
                .map(|(r, &(s, e))| fetch_window(&self.track, &r.chr, s, e))
                .collect::<GeneratorResult<Vec<_>>>()?;
            BatchLabels::Sequence(stack_samples(&samples)?)
        } else {
            let values = rows
                .iter()
                .map(|r| {
                    r.value()
                        .ok_or_else(|| GeneratorError::MissingValue(r.as_string()))
                })
                .collect::<GeneratorResult<Vec<f32>>>()?;
            BatchLabels::Values(Array1::from_vec(values))
        };

        Ok(Batch {
            inputs,
            labels: Some(labels),
        })
    }

    /// Every batch of the current epoch, in order.
    pub fn iter_batches(&self) -> impl Iterator<Item = GeneratorResult<Batch>> + '_ {
        (0..self.len()).map(move |index| self.get_batch(index))
    }
}
