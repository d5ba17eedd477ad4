use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, concatenate, stack};

use genomeloader_core::SequenceProvider;

use crate::error::{GeneratorError, GeneratorResult};

/// Model inputs of one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchInputs {
    /// One-hot genome windows, `(batch, seq_len, 4)`.
    Sequence(Array3<f32>),
    /// Genome windows first, then one array per signal track in configuration order.
    WithSignals(Vec<Array3<f32>>),
}

impl BatchInputs {
    /// The genome array, present in every batch.
    pub fn genome(&self) -> &Array3<f32> {
        match self {
            BatchInputs::Sequence(genome) => genome,
            BatchInputs::WithSignals(arrays) => &arrays[0],
        }
    }

    /// Signal track arrays; empty when no tracks are configured.
    pub fn signals(&self) -> &[Array3<f32>] {
        match self {
            BatchInputs::Sequence(_) => &[],
            BatchInputs::WithSignals(arrays) => &arrays[1..],
        }
    }

    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.genome().len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Targets of one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchLabels {
    /// Majority-coverage flag per label source, `(batch, n_beds)`.
    Binary(Array2<bool>),
    /// Per-position label values, `(batch, output_seq_len, features)`.
    Sequence(Array3<f32>),
    /// One scalar per sample.
    Values(Array1<f32>),
}

impl BatchLabels {
    pub fn len(&self) -> usize {
        match self {
            BatchLabels::Binary(labels) => labels.nrows(),
            BatchLabels::Sequence(labels) => labels.len_of(Axis(0)),
            BatchLabels::Values(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: BatchInputs,
    /// `None` when the generator was configured without outputs.
    pub labels: Option<BatchLabels>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

///
/// Fetch `[start, end)` from a provider and check the window against the
/// length contract and the provider's declared feature count.
///
pub(crate) fn fetch_window<P: SequenceProvider + ?Sized>(
    provider: &P,
    chrom: &str,
    start: i64,
    end: i64,
) -> GeneratorResult<Array2<f32>> {
    let window = provider.fetch(chrom, start, end)?;
    let expected = (end - start).max(0) as usize;
    if window.nrows() != expected {
        return Err(GeneratorError::FetchLength {
            chrom: chrom.to_string(),
            start,
            end,
            got: window.nrows(),
        });
    }
    if window.ncols() != provider.n_features() {
        return Err(GeneratorError::FetchWidth {
            chrom: chrom.to_string(),
            expected: provider.n_features(),
            got: window.ncols(),
        });
    }
    Ok(window)
}

/// Stack per-sample `(len, features)` arrays into `(batch, len, features)`.
pub(crate) fn stack_samples(samples: &[Array2<f32>]) -> GeneratorResult<Array3<f32>> {
    let views: Vec<ArrayView2<f32>> = samples.iter().map(|s| s.view()).collect();
    Ok(stack(Axis(0), &views)?)
}

/// Join per-source `(len, features)` arrays along the feature axis.
pub(crate) fn concat_features(parts: &[Array2<f32>]) -> GeneratorResult<Array2<f32>> {
    let views: Vec<ArrayView2<f32>> = parts.iter().map(|p| p.view()).collect();
    Ok(concatenate(Axis(1), &views)?)
}

///
/// Accumulates the genome and signal windows of one batch, sample by sample.
///
pub(crate) struct InputCollector<'a> {
    signals: &'a [Box<dyn SequenceProvider>],
    genome_windows: Vec<Array2<f32>>,
    signal_windows: Vec<Vec<Array2<f32>>>,
}

impl<'a> InputCollector<'a> {
    pub fn new(signals: &'a [Box<dyn SequenceProvider>], capacity: usize) -> Self {
        InputCollector {
            signals,
            genome_windows: Vec::with_capacity(capacity),
            signal_windows: signals
                .iter()
                .map(|_| Vec::with_capacity(capacity))
                .collect(),
        }
    }

    /// Fetch the same window from the genome and from every signal track.
    pub fn push<G: SequenceProvider + ?Sized>(
        &mut self,
        genome: &G,
        chrom: &str,
        start: i64,
        end: i64,
    ) -> GeneratorResult<()> {
        self.genome_windows
            .push(fetch_window(genome, chrom, start, end)?);
        for (track, windows) in self.signals.iter().zip(self.signal_windows.iter_mut()) {
            windows.push(fetch_window(track.as_ref(), chrom, start, end)?);
        }
        Ok(())
    }

    pub fn finish(self) -> GeneratorResult<BatchInputs> {
        let genome = stack_samples(&self.genome_windows)?;
        if self.signal_windows.is_empty() {
            return Ok(BatchInputs::Sequence(genome));
        }

        let mut arrays = Vec::with_capacity(self.signal_windows.len() + 1);
        arrays.push(genome);
        for windows in &self.signal_windows {
            arrays.push(stack_samples(windows)?);
        }
        Ok(BatchInputs::WithSignals(arrays))
    }
}
