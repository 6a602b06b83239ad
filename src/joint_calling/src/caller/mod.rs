use crate::{
    distribution::CopyNumberDistribution,
    error::CallerError,
    genotype::{
        copy_number_combinations, genotypes_by_cn, offspring_genotypes, parental_genotypes,
        Genotype,
    },
    model::TransitionMatrix,
    params::CallerParams,
    pedigree::{Pedigree, Sample},
    segments::{Haplotype, Segment, SegmentSet},
};

mod pedigree;
pub use self::pedigree::call_joint_segment;

mod cohort;
pub use cohort::{call_cohort_segment, CohortScore};

mod quality;
pub use quality::phred_quality;

mod mcc;
pub use mcc::{assign_cohort_mcc, assign_pedigree_mcc, use_allele_information};

mod driver;
pub use driver::{call_segment_sets, partition_ranges};

/// Per-segment evidence handed from the inference kernels to the scorer.
#[derive(Debug)]
pub(crate) enum Evidence {
    Joint(CopyNumberDistribution),
    Cohort(Vec<Vec<f64>>),
}

/// Read-only context of a pedigree-mode run: the family, the transmission
/// model and the pre-enumerated genotype tables, shared across workers.
#[derive(Debug)]
pub struct JointContext {
    pedigree: Pedigree,
    transition: TransitionMatrix,
    offspring: Vec<Vec<Genotype>>,
    genotype_tables: Vec<Vec<Genotype>>,
    params: CallerParams,
}

/// Read-only context of a no-pedigree run.
#[derive(Debug)]
pub struct CohortContext {
    samples: Vec<Sample>,
    combinations: Vec<Vec<usize>>,
    genotype_tables: Vec<Vec<Genotype>>,
    params: CallerParams,
}

/// Everything a worker needs to call, score and annotate segments.
#[derive(Debug)]
pub enum CallContext {
    Joint(JointContext),
    Cohort(CohortContext),
}

impl CallContext {
    /// Context for a pedigree-aware run. The offspring genotype enumeration
    /// is capped and, when capped, subsampled with the seed carried by
    /// `params`.
    #[must_use]
    pub fn joint(pedigree: Pedigree, params: CallerParams) -> Self {
        let transition = TransitionMatrix::new(params.max_copy_number);
        let parental = parental_genotypes(params.max_copy_number);
        let mut rng = fastrand::Rng::with_seed(params.seed);
        let offspring = offspring_genotypes(
            &parental,
            pedigree.proband_count(),
            params.max_offspring_genotypes,
            &mut rng,
        );
        let genotype_tables = genotypes_by_cn(params.max_copy_number);
        Self::Joint(JointContext{pedigree, transition, offspring, genotype_tables, params})
    }

    /// Context for an independent-samples run.
    #[must_use]
    pub fn cohort(samples: Vec<Sample>, params: CallerParams) -> Self {
        let combinations = copy_number_combinations(params.max_copy_number, params.max_allele_number);
        let genotype_tables = genotypes_by_cn(params.max_copy_number);
        Self::Cohort(CohortContext{samples, combinations, genotype_tables, params})
    }

    #[must_use]
    pub fn params(&self) -> &CallerParams {
        match self {
            Self::Joint(ctx) => &ctx.params,
            Self::Cohort(ctx) => &ctx.params,
        }
    }

    /// Samples in working order (probands first in pedigree mode).
    #[must_use]
    pub fn samples(&self) -> Vec<&Sample> {
        match self {
            Self::Joint(ctx) => ctx.pedigree.samples().iter().collect(),
            Self::Cohort(ctx) => ctx.samples.iter().collect(),
        }
    }

    #[must_use]
    pub fn pedigree(&self) -> Option<&Pedigree> {
        match self {
            Self::Joint(ctx) => Some(&ctx.pedigree),
            Self::Cohort(_) => None,
        }
    }

    /// Run the mode's inference kernel on one segment, returning its score
    /// (the quantity the haplotype selector averages) and the evidence the
    /// scorer consumes.
    pub(crate) fn call_segment(&self, segment: &mut Segment) -> Result<(f64, Evidence), CallerError> {
        match self {
            Self::Joint(ctx) => {
                let distribution = call_joint_segment(
                    segment,
                    &ctx.pedigree,
                    &ctx.transition,
                    &ctx.offspring,
                    &ctx.params,
                )?;
                Ok((distribution.peak(), Evidence::Joint(distribution)))
            },
            Self::Cohort(ctx) => {
                let samples: Vec<&Sample> = ctx.samples.iter().collect();
                let score = call_cohort_segment(segment, &samples, &ctx.combinations, &ctx.params)?;
                Ok((score.total, Evidence::Cohort(score.restricted)))
            },
        }
    }

    /// Quality-score one called segment, then refine major chromosome counts
    /// when the segment carries usable allele evidence.
    pub(crate) fn score_segment(&self, segment: &mut Segment, evidence: &Evidence) {
        match (self, evidence) {
            (Self::Joint(ctx), Evidence::Joint(distribution)) => {
                quality::score_joint_segment(segment, distribution, &ctx.pedigree, &ctx.params);
                let samples: Vec<&Sample> = ctx.pedigree.samples().iter().collect();
                if use_allele_information(segment, &samples, &ctx.params) {
                    assign_pedigree_mcc(segment, &ctx.pedigree, &ctx.genotype_tables, &ctx.params);
                }
            },
            (Self::Cohort(ctx), Evidence::Cohort(restricted)) => {
                quality::score_cohort_segment(segment, restricted, &ctx.params);
                let samples: Vec<&Sample> = ctx.samples.iter().collect();
                if use_allele_information(segment, &samples, &ctx.params) {
                    assign_cohort_mcc(segment, &samples, &ctx.genotype_tables, &ctx.params);
                }
            },
            _ => unreachable!("evidence produced by a different calling mode"),
        }
    }
}

/// Evaluate both haplotypes of a set and pick the one with the higher average
/// per-segment score, haplotype A on ties. Returns the choice together with
/// the chosen haplotype's per-segment evidence.
pub(crate) fn select_haplotype(
    set: &mut SegmentSet,
    context: &CallContext,
) -> Result<(Haplotype, Vec<Evidence>), CallerError> {
    let evaluate = |set: &mut SegmentSet, which| -> Result<Option<(f64, Vec<Evidence>)>, CallerError> {
        let Some(segments) = set.haplotype_mut(which) else { return Ok(None) };
        let mut evidences = Vec::with_capacity(segments.len());
        let mut sum = 0.0;
        for segment in segments.iter_mut() {
            let (score, evidence) = context.call_segment(segment)?;
            sum += score;
            evidences.push(evidence);
        }
        let average = sum / evidences.len().max(1) as f64;
        Ok(Some((average, evidences)))
    };

    let scored_a = evaluate(set, Haplotype::A)?;
    let scored_b = evaluate(set, Haplotype::B)?;
    match (scored_a, scored_b) {
        (Some((average_a, evidence_a)), Some((average_b, evidence_b))) => {
            if average_a >= average_b {
                Ok((Haplotype::A, evidence_a))
            } else {
                Ok((Haplotype::B, evidence_b))
            }
        },
        (Some((_, evidence)), None) => Ok((Haplotype::A, evidence)),
        (None, Some((_, evidence))) => Ok((Haplotype::B, evidence)),
        (None, None) => Err(CallerError::EmptySegmentSet(set.span().to_string())),
    }
}

/// Fully process one segment set: haplotype selection, then scoring and
/// annotation of the selected haplotype's segments.
pub(crate) fn process_set(set: &mut SegmentSet, context: &CallContext) -> Result<(), CallerError> {
    let (choice, evidences) = select_haplotype(set, context)?;
    set.select(choice);
    let segments = set.haplotype_mut(choice)
        .expect("the selected haplotype was just evaluated");
    for (segment, evidence) in segments.iter_mut().zip(&evidences) {
        context.score_segment(segment, evidence);
    }
    Ok(())
}
