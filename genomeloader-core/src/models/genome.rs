use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use anyhow::Result;
use bio::io::fasta;
use ndarray::Array2;

use crate::errors::GenomeError;
use crate::providers::{ChromSizeProvider, SequenceProvider};

/// Column order of the one-hot encoding.
pub const ALPHABET: [u8; 4] = [b'A', b'C', b'G', b'T'];

///
/// A genome held in memory, sliced as one-hot `(len, 4)` arrays.
///
/// Positions outside `[0, chrom_len)` and any symbol other than A/C/G/T
/// (case-insensitive) come back as all-zero rows.
///
pub struct GenomeAssembly {
    seq_map: HashMap<String, Vec<u8>>,
}

impl TryFrom<&str> for GenomeAssembly {
    type Error = GenomeError;

    fn try_from(value: &str) -> Result<Self, GenomeError> {
        GenomeAssembly::try_from(Path::new(value))
    }
}

impl TryFrom<&Path> for GenomeAssembly {
    type Error = GenomeError;

    ///
    /// Create a new [GenomeAssembly] from fasta file
    ///
    fn try_from(value: &Path) -> Result<GenomeAssembly, GenomeError> {
        let file = File::open(value)?;
        let genome = fasta::Reader::new(file);

        let mut seq_map: HashMap<String, Vec<u8>> = HashMap::new();
        for record in genome.records() {
            let record = record.map_err(|e| GenomeError::FastaReadError(e.to_string()))?;
            seq_map.insert(record.id().to_string(), record.seq().to_owned());
        }

        Ok(GenomeAssembly { seq_map })
    }
}

impl From<HashMap<String, Vec<u8>>> for GenomeAssembly {
    fn from(seq_map: HashMap<String, Vec<u8>>) -> Self {
        GenomeAssembly { seq_map }
    }
}

#[inline]
fn encode_base(base: u8) -> Option<usize> {
    let upper = base.to_ascii_uppercase();
    ALPHABET.iter().position(|&b| b == upper)
}

impl SequenceProvider for GenomeAssembly {
    fn fetch(&self, chrom: &str, start: i64, end: i64) -> Result<Array2<f32>> {
        let seq = self
            .seq_map
            .get(chrom)
            .ok_or_else(|| GenomeError::UnknownChromosome(chrom.to_string()))?;

        let len = (end - start).max(0) as usize;
        let mut out = Array2::<f32>::zeros((len, ALPHABET.len()));

        // only the part of the window that lands on the chromosome is filled
        let lo = start.max(0);
        let hi = end.min(seq.len() as i64);
        for pos in lo..hi {
            if let Some(col) = encode_base(seq[pos as usize]) {
                out[[(pos - start) as usize, col]] = 1.0;
            }
        }

        Ok(out)
    }

    fn n_features(&self) -> usize {
        ALPHABET.len()
    }
}

impl ChromSizeProvider for GenomeAssembly {
    fn chrom_sizes(&self) -> HashMap<String, u32> {
        self.seq_map
            .iter()
            .map(|(chrom, seq)| (chrom.clone(), seq.len() as u32))
            .collect()
    }
}
