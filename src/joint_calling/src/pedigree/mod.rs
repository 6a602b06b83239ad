use genome::{GenomicRange, PloidyMap};
use log::warn;

use crate::{model::CoverageModel, params::CallerParams};

mod error;
pub use error::PedigreeError;

pub mod parser;

/// Family role of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kinship {
    Parent,
    Proband,
    Other,
}

/// One sequenced individual: immutable identity plus the derived metadata the
/// kernels consume. Read-only once the calling pass starts.
pub struct Sample {
    name: String,
    kin: Kinship,
    ploidy: PloidyMap,
    mean_coverage: f64,
    max_coverage: f64,
    model: Box<dyn CoverageModel>,
}

impl std::fmt::Debug for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample")
            .field("name", &self.name)
            .field("kin", &self.kin)
            .field("mean_coverage", &self.mean_coverage)
            .finish_non_exhaustive()
    }
}

impl Sample {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kin: Kinship,
        mean_coverage: f64,
        ploidy: PloidyMap,
        model: Box<dyn CoverageModel>,
    ) -> Self {
        Self {
            name: name.into(),
            kin,
            ploidy,
            mean_coverage,
            max_coverage: CallerParams::coverage_cap(mean_coverage),
            model,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kin(&self) -> Kinship {
        self.kin
    }

    #[must_use]
    pub fn mean_coverage(&self) -> f64 {
        self.mean_coverage
    }

    /// Observed coverage, capped at the sample's ceiling.
    #[must_use]
    pub fn capped_coverage(&self, coverage: f64) -> f64 {
        coverage.min(self.max_coverage)
    }

    /// Expected copy number of this sample over a genomic range.
    #[must_use]
    pub fn expected_ploidy(&self, range: &GenomicRange) -> usize {
        self.ploidy.expected_ploidy(range) as usize
    }

    #[must_use]
    pub fn model(&self) -> &dyn CoverageModel {
        self.model.as_ref()
    }
}

/// The working family: probands first, the two parents last, in their input
/// order. The parent slots are fixed for the whole run, so parent one and
/// parent two always address the same joint-distribution axes.
#[derive(Debug)]
pub struct Pedigree {
    samples: Vec<Sample>,
}

impl Pedigree {
    /// Order samples into the working list and validate the family shape:
    /// exactly two parents, at least one proband. Samples of any other
    /// kinship are dropped with a warning.
    pub fn new(samples: Vec<Sample>) -> Result<Self, PedigreeError> {
        let mut probands = Vec::new();
        let mut parents = Vec::new();
        for sample in samples {
            match sample.kin() {
                Kinship::Proband => probands.push(sample),
                Kinship::Parent  => parents.push(sample),
                Kinship::Other   => {
                    warn!("Ignoring sample {}: neither parent nor proband", sample.name());
                },
            }
        }
        if parents.len() != 2 {
            return Err(PedigreeError::ParentCount(parents.len()))
        }
        if probands.is_empty() {
            return Err(PedigreeError::NoProbands)
        }
        probands.extend(parents);
        Ok(Self{samples: probands})
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn sample(&self, index: usize) -> &Sample {
        &self.samples[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn proband_count(&self) -> usize {
        self.samples.len() - 2
    }

    /// Indices of the probands within the working list.
    #[must_use]
    pub fn proband_indices(&self) -> std::ops::Range<usize> {
        0..self.proband_count()
    }

    #[must_use]
    pub fn parent1_index(&self) -> usize {
        self.samples.len() - 2
    }

    #[must_use]
    pub fn parent2_index(&self) -> usize {
        self.samples.len() - 1
    }

    #[must_use]
    pub fn is_proband(&self, index: usize) -> bool {
        index < self.proband_count()
    }

    /// Joint-distribution axis of a sample: parent one on axis 0, parent two
    /// on axis 1, probands on the axes beyond.
    #[must_use]
    pub fn axis_of(&self, index: usize) -> usize {
        if index == self.parent1_index() {
            0
        } else if index == self.parent2_index() {
            1
        } else {
            2 + index
        }
    }
}
