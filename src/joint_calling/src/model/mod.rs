use std::fmt::Debug;

use statrs::distribution::{Binomial, Continuous, Discrete, Normal};

use crate::{genotype::Genotype, segments::AlleleCount};

mod transition;
pub use transition::TransitionMatrix;

/// Smallest B-allele fraction a genotype may predict; keeps homozygous
/// genotypes from zeroing out every observation carrying a stray read.
const MIN_ALLELE_FRACTION: f64 = 0.01;

/// Ceiling of the Phred-like score reported for a best-genotype pick.
const MAX_GENOTYPE_SCORE: f64 = 60.0;

/// Outcome of scoring a candidate-genotype list against allele observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestGenotype {
    /// Index of the winning candidate within the scored list.
    pub index: usize,
    /// Phred-like confidence of the pick.
    pub score: f64,
}

/// Per-sample likelihood model connecting observed read depth and allele
/// counts to copy-number states.
///
/// Implementations are read-only after construction and shared across
/// worker threads.
pub trait CoverageModel: Debug + Send + Sync {
    /// Unnormalized likelihood of each copy-number state given the observed
    /// segment coverage. The returned vector has one entry per modeled state.
    fn depth_likelihoods(&self, coverage: f64) -> Vec<f64>;

    /// Joint likelihood of the SNV allele observations under a candidate
    /// genotype.
    fn genotype_likelihood(&self, alleles: &[AlleleCount], genotype: Genotype) -> f64;

    /// Score every candidate genotype and report the best one. `None` when
    /// the candidate list is empty.
    fn best_genotype(&self, alleles: &[AlleleCount], candidates: &[Genotype]) -> Option<BestGenotype> {
        if candidates.is_empty() {
            return None
        }
        let likelihoods: Vec<f64> = candidates.iter()
            .map(|&genotype| self.genotype_likelihood(alleles, genotype))
            .collect();
        let index = likelihoods.iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let total: f64 = likelihoods.iter().sum();
        let residual = (total - likelihoods[index]) / total;
        let score = if residual.is_finite() && residual > 0.0 {
            (-10.0 * residual.log10()).clamp(0.0, MAX_GENOTYPE_SCORE)
        } else {
            MAX_GENOTYPE_SCORE
        };
        Some(BestGenotype{index, score})
    }
}

/// The shipped depth model: one Gaussian per copy-number state, centered on
/// `mean_coverage * cn / 2` (with a small floor for the zero-copy state) and
/// sharing a single per-sample variance. The shared width keeps exact-fit
/// likelihoods comparable across states, so a segment is never rewarded for
/// merely being shallow.
#[derive(Debug, Clone)]
pub struct GaussianCoverageModel {
    states: Vec<Normal>,
}

impl GaussianCoverageModel {
    /// Model with the default Poisson-width variance (equal to the mean).
    #[must_use]
    pub fn new(mean_coverage: f64, max_copy_number: usize) -> Self {
        Self::with_variance(mean_coverage, mean_coverage, max_copy_number)
    }

    /// Model with an explicitly estimated coverage variance.
    #[must_use]
    pub fn with_variance(mean_coverage: f64, variance: f64, max_copy_number: usize) -> Self {
        let std_dev = variance.max(1.0).sqrt();
        let states = (0..max_copy_number)
            .map(|cn| {
                let mean = mean_coverage * (cn as f64).max(0.1) / 2.0;
                Normal::new(mean, std_dev).expect("positive coverage spread")
            })
            .collect();
        Self{states}
    }
}

impl CoverageModel for GaussianCoverageModel {
    fn depth_likelihoods(&self, coverage: f64) -> Vec<f64> {
        self.states.iter().map(|state| state.pdf(coverage)).collect()
    }

    fn genotype_likelihood(&self, alleles: &[AlleleCount], genotype: Genotype) -> f64 {
        let fraction = if genotype.total() == 0 {
            0.5
        } else {
            (genotype.count_b as f64 / genotype.total() as f64)
                .clamp(MIN_ALLELE_FRACTION, 1.0 - MIN_ALLELE_FRACTION)
        };

        let mut likelihood = 1.0;
        for observation in alleles {
            let depth = observation.depth();
            if depth == 0 {
                continue
            }
            let binomial = match Binomial::new(fraction, u64::from(depth)) {
                Ok(binomial) => binomial,
                Err(_) => return 0.0,
            };
            likelihood *= binomial.pmf(u64::from(observation.b));
        }
        if likelihood.is_finite() { likelihood } else { 0.0 }
    }
}
