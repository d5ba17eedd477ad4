use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionSetError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Error parsing region: {0}")]
    RegionParseError(String),

    #[error("Corrupted file. 0 regions found in the file: {0}")]
    EmptyRegionSet(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum GenomeError {
    #[error("Error reading genome file: {0}")]
    FastaReadError(String),

    #[error("Chromosome not found in genome: {0}")]
    UnknownChromosome(String),

    #[error("Error parsing chrom sizes: {0}")]
    ChromSizesParseError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
