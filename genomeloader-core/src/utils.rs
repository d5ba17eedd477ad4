use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use crate::errors::GenomeError;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Read a two column `chrom<TAB>size` file.
///
pub fn get_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<HashMap<String, u32>, GenomeError> {
    let file_buf = BufReader::new(File::open(path.as_ref())?);

    let mut chrom_sizes: HashMap<String, u32> = HashMap::new();
    for line in file_buf.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let (Some(chrom), Some(size)) = (parts.next(), parts.next()) else {
            continue;
        };
        let size = size
            .parse::<u32>()
            .map_err(|_| GenomeError::ChromSizesParseError(line.clone()))?;
        chrom_sizes.insert(chrom.to_string(), size);
    }

    Ok(chrom_sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[rstest]
    fn test_get_chrom_sizes() {
        let path = std::env::current_dir()
            .unwrap()
            .join("../tests/data/genome/toy.chrom.sizes");
        let chrom_sizes = get_chrom_sizes(path).unwrap();
        assert_eq!(chrom_sizes.len(), 2);
        assert_eq!(chrom_sizes["chr1"], 4000);
        assert_eq!(chrom_sizes["chr2"], 2000);
    }

    #[rstest]
    fn test_get_chrom_sizes_bad_size() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("bad.sizes");
        std::fs::write(&path, "chr1\tlots\n").unwrap();
        assert!(matches!(
            get_chrom_sizes(&path),
            Err(GenomeError::ChromSizesParseError(_))
        ));
    }

    #[rstest]
    fn test_dynamic_reader_gz() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("rows.bed.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::fast());
        encoder.write_all(b"chr1\t0\t10\n").unwrap();
        encoder.finish().unwrap();

        let lines: Vec<String> = get_dynamic_reader(&path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["chr1\t0\t10".to_string()]);
    }
}
