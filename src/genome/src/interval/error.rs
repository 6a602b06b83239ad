use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenomicRangeError {
    #[error("Invalid genomic range: begin ({begin}) must lie before end ({end})")]
    EmptyRange{begin: u32, end: u32},

    #[error("Failed to parse genomic range from {0:?}. Expected '<chrom>:<begin>-<end>'")]
    ParseRange(String),
}
