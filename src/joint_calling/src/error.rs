use thiserror::Error;

use crate::pedigree::PedigreeError;

#[derive(Error, Debug)]
pub enum CallerError {
    #[error("Invalid parameter --{name}: {reason}")]
    InvalidParameter{name: &'static str, reason: String},

    #[error("Mismatched sample counts while {context}: expected {expected}, found {found}")]
    SampleCountMismatch{context: &'static str, expected: usize, found: usize},

    #[error("Segment tables disagree: sample {sample} carries {range} where {expected} was expected")]
    SegmentTableMismatch{sample: String, range: String, expected: String},

    #[error("Chromosome {chrom} of {source_name} matches no chromosome of the segmentation input")]
    ChromosomeMismatch{source_name: String, chrom: String},

    #[error("Negative coverage ({coverage}) for sample {sample} over {range}")]
    NegativeCoverage{sample: String, range: String, coverage: f64},

    #[error("Empty depth-likelihood vector for sample {0}")]
    EmptyLikelihoods(String),

    #[error("Parental likelihood dimensions disagree: {parent1} vs {parent2}")]
    ParentalLikelihoodMismatch{parent1: usize, parent2: usize},

    #[error("Segment set over {0} provides neither haplotype")]
    EmptySegmentSet(String),

    #[error("Haplotypes of one segment set span different extents: {hap_a} vs {hap_b}")]
    HaplotypeExtentMismatch{hap_a: String, hap_b: String},

    #[error("Segment set over {0} reached the merge stage without a selected haplotype")]
    UnselectedSegmentSet(String),

    #[error("Failed to build the worker pool")]
    BuildThreadPool(#[source] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Pedigree(#[from] PedigreeError),
}
