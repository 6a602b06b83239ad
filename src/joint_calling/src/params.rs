use crate::error::CallerError;

/// Hard ceiling on quality scores when no dedicated bound is configured.
pub const DEFAULT_MAX_Q_SCORE: f64 = 60.0;

/// Observed segment coverage is capped at this multiple of the sample's mean
/// coverage before likelihood evaluation, so collapsed repeats do not drag
/// the depth model off-scale.
pub const MAX_COVERAGE_MULTIPLIER: f64 = 3.0;

/// Tunable knobs of the caller.
///
/// Every threshold carries the default used by the command line surface;
/// [`CallerParams::validate`] rejects combinations the kernels cannot honor.
#[derive(Debug, Clone)]
pub struct CallerParams {
    /// Number of modeled copy-number states. Calls lie in `0..max_copy_number`.
    pub max_copy_number: usize,
    /// Upper bound on the worker-thread count.
    pub max_core_number: usize,
    /// Cap on the enumerated offspring genotype combinations. Larger products
    /// are subsampled down to this many entries.
    pub max_offspring_genotypes: usize,
    /// Largest number of distinct copy-number states allowed inside one
    /// cohort-mode combination.
    pub max_allele_number: usize,
    /// Minimum number of heterozygous SNV observations (per sample, per
    /// segment) required before allele evidence is consulted.
    pub read_counts_threshold: usize,
    /// Heterozygous SNVs per kilobase below which allele evidence is reported
    /// as sparse.
    pub allele_density_threshold: f64,
    /// At most this many SNV observations per segment enter the allele
    /// likelihoods.
    pub per_segment_allele_max_counts: usize,
    /// Mean coverage below which a sample is flagged as shallow.
    pub median_coverage_threshold: f64,
    /// Ceiling applied to every Phred-scaled score.
    pub max_q_score: f64,
    /// Calls scoring below this quality receive a filter label.
    pub quality_filter_threshold: f64,
    /// De-novo calls scoring below this quality receive a filter label.
    pub de_novo_quality_filter_threshold: f64,
    /// Baseline probability of a copy-number mutation unexplained by either
    /// parent. Also floors the de-novo probability inside the quality
    /// transform.
    pub de_novo_rate: f64,
    /// Calls shorter than this many base pairs receive a size filter label.
    pub minimum_call_size: u32,
    /// Adjacent same-state segments separated by at most this many base pairs
    /// are merged.
    pub max_merge_gap: u32,
    /// Bins dropped from each segment flank before the coverage median.
    pub number_of_trimmed_bins: usize,
    /// Seed of the genotype-subsampling RNG. Identical seeds reproduce runs
    /// bit for bit.
    pub seed: u64,
}

impl Default for CallerParams {
    fn default() -> Self {
        Self {
            max_copy_number: 5,
            max_core_number: 30,
            max_offspring_genotypes: 500,
            max_allele_number: 3,
            read_counts_threshold: 4,
            allele_density_threshold: 0.1,
            per_segment_allele_max_counts: 100,
            median_coverage_threshold: 4.0,
            max_q_score: DEFAULT_MAX_Q_SCORE,
            quality_filter_threshold: 7.0,
            de_novo_quality_filter_threshold: 20.0,
            de_novo_rate: 1e-6,
            minimum_call_size: 2000,
            max_merge_gap: 10_000,
            number_of_trimmed_bins: 2,
            seed: 42,
        }
    }
}

impl CallerParams {
    /// Ensure the parameter set is one the kernels can honor.
    ///
    /// # Errors
    /// [`CallerError::InvalidParameter`] naming the offending knob.
    pub fn validate(&self) -> Result<(), CallerError> {
        let invalid = |name: &'static str, reason: &str| {
            Err(CallerError::InvalidParameter{name, reason: reason.to_string()})
        };
        if self.max_copy_number < 3 {
            // The de-novo scorer addresses the diploid state explicitly.
            return invalid("max-copy-number", "at least three copy-number states are required")
        }
        if self.max_core_number == 0 {
            return invalid("threads", "at least one worker is required")
        }
        if self.max_offspring_genotypes == 0 {
            return invalid("max-offspring-genotypes", "the genotype cap cannot be zero")
        }
        if self.max_allele_number == 0 {
            return invalid("max-allele-number", "combinations need at least one state")
        }
        if !(self.de_novo_rate > 0.0 && self.de_novo_rate < 1.0) {
            return invalid("de-novo-rate", "must lie strictly within (0, 1)")
        }
        if !(self.max_q_score > 0.0) {
            return invalid("max-q-score", "must be positive")
        }
        Ok(())
    }

    /// Observed-coverage ceiling for a sample with the given mean coverage.
    #[must_use]
    pub fn coverage_cap(mean_coverage: f64) -> f64 {
        MAX_COVERAGE_MULTIPLIER * mean_coverage
    }

    /// Map the command line surface onto a parameter set.
    #[must_use]
    pub fn from_cli(args: &parser::Call) -> Self {
        Self {
            max_copy_number: args.max_copy_number,
            max_core_number: args.threads,
            max_offspring_genotypes: args.max_offspring_genotypes,
            max_allele_number: args.max_allele_number,
            read_counts_threshold: args.read_counts_threshold,
            allele_density_threshold: args.allele_density_threshold,
            per_segment_allele_max_counts: args.per_segment_allele_max_counts,
            median_coverage_threshold: args.median_coverage_threshold,
            max_q_score: args.max_q_score,
            quality_filter_threshold: args.quality_filter_threshold,
            de_novo_quality_filter_threshold: args.de_novo_quality_filter_threshold,
            de_novo_rate: args.de_novo_rate,
            minimum_call_size: args.minimum_call_size,
            max_merge_gap: args.max_merge_gap,
            number_of_trimmed_bins: args.number_of_trimmed_bins,
            seed: args.seed,
        }
    }
}
