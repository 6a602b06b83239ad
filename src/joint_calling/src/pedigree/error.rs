use thiserror::Error;

#[derive(Error, Debug)]
pub enum PedigreeError {
    #[error(transparent)]
    ParsePedigree(#[from] std::io::Error),

    #[error("Pedigree line {0} does not carry the six required fields")]
    InvalidFields(usize),

    #[error("Sample {0} appears more than once in the pedigree")]
    DuplicateSample(String),

    #[error("Pedigree defines {0} parents, where exactly two are required")]
    ParentCount(usize),

    #[error("Pedigree defines no proband")]
    NoProbands,

    #[error("Pedigree entry {0} matches no segmentation input")]
    MissingSample(String),
}
