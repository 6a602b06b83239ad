use crate::{
    distribution::CopyNumberDistribution,
    error::CallerError,
    genotype::Genotype,
    model::TransitionMatrix,
    params::CallerParams,
    pedigree::Pedigree,
    segments::Segment,
};

/// Jointly call one segment across a pedigree.
///
/// Sweeps every `(parent1 CN, parent2 CN, offspring genotype vector)` tuple,
/// accumulating the maximum joint likelihood per copy-number index into the
/// returned distribution and writing the argmax assignment into the
/// segment's call state. Calls are reset to diploid first, so a degenerate
/// segment (all likelihoods zero) comes out diploid everywhere.
pub fn call_joint_segment(
    segment: &mut Segment,
    pedigree: &Pedigree,
    transition: &TransitionMatrix,
    offspring_genotypes: &[Vec<Genotype>],
    params: &CallerParams,
) -> Result<CopyNumberDistribution, CallerError> {
    let states = params.max_copy_number;
    if segment.samples.len() != pedigree.len() {
        return Err(CallerError::SampleCountMismatch{
            context: "calling a pedigree segment",
            expected: pedigree.len(),
            found: segment.samples.len(),
        })
    }

    for slot in &mut segment.samples {
        slot.call.copy_number = 2;
    }

    let depth_likelihoods = |index: usize| -> Result<Vec<f64>, CallerError> {
        let sample = pedigree.sample(index);
        let coverage = segment.coverage(index, params.number_of_trimmed_bins);
        if coverage < 0.0 {
            return Err(CallerError::NegativeCoverage{
                sample: sample.name().to_string(),
                range: segment.range.to_string(),
                coverage,
            })
        }
        let likelihoods = sample.model().depth_likelihoods(sample.capped_coverage(coverage));
        if likelihoods.is_empty() {
            return Err(CallerError::EmptyLikelihoods(sample.name().to_string()))
        }
        Ok(likelihoods)
    };

    let parent1 = pedigree.parent1_index();
    let parent2 = pedigree.parent2_index();
    let parent1_likelihoods = depth_likelihoods(parent1)?;
    let parent2_likelihoods = depth_likelihoods(parent2)?;
    if parent1_likelihoods.len() != parent2_likelihoods.len() {
        return Err(CallerError::ParentalLikelihoodMismatch{
            parent1: parent1_likelihoods.len(),
            parent2: parent2_likelihoods.len(),
        })
    }
    // The offspring combinations dictate how many children the sweep sees;
    // an empty combination degrades gracefully to a parents-only sweep.
    let probands = offspring_genotypes.first().map_or(0, Vec::len);
    let proband_likelihoods: Vec<Vec<f64>> = pedigree.proband_indices()
        .take(probands)
        .map(depth_likelihoods)
        .collect::<Result<_, _>>()?;

    let mut distribution = CopyNumberDistribution::new(2 + probands, states);
    let mut index = vec![0usize; 2 + probands];
    let mut best_likelihood = 0.0;

    for parent1_cn in 0..states {
        for parent2_cn in 0..states {
            let parental = parent1_likelihoods[parent1_cn] * parent2_likelihoods[parent2_cn];
            index[0] = parent1_cn;
            index[1] = parent2_cn;

            for genotypes in offspring_genotypes {
                let mut likelihood = parental;
                for (child, genotype) in genotypes.iter().enumerate() {
                    let child_cn = genotype.total().min(states - 1);
                    likelihood *= transition.probability(parent1_cn, genotype.count_a)
                        * transition.probability(parent2_cn, genotype.count_b)
                        * proband_likelihoods[child][child_cn];
                    index[2 + child] = child_cn;
                }
                if !likelihood.is_finite() {
                    likelihood = 0.0;
                }
                distribution.record_max(&index, likelihood);

                if likelihood > best_likelihood {
                    best_likelihood = likelihood;
                    segment.samples[parent1].call.copy_number = parent1_cn;
                    segment.samples[parent2].call.copy_number = parent2_cn;
                    for (child, genotype) in genotypes.iter().enumerate() {
                        segment.samples[child].call.copy_number =
                            genotype.total().min(states - 1);
                    }
                }
            }
        }
    }
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::{offspring_genotypes, parental_genotypes};
    use crate::model::GaussianCoverageModel;
    use crate::pedigree::{Kinship, PedigreeError, Sample};
    use crate::segments::SegmentSample;
    use float_cmp::assert_approx_eq;
    use genome::{GenomicRange, PloidyMap};

    fn sample(name: &str, kin: Kinship, mean_coverage: f64) -> Sample {
        let model = Box::new(GaussianCoverageModel::new(mean_coverage, 5));
        Sample::new(name, kin, mean_coverage, PloidyMap::default(), model)
    }

    fn trio() -> Result<Pedigree, PedigreeError> {
        Pedigree::new(vec![
            sample("father", Kinship::Parent, 30.0),
            sample("mother", Kinship::Parent, 30.0),
            sample("child",  Kinship::Proband, 30.0),
        ])
    }

    /// Working order: child, father, mother.
    fn trio_segment(coverages: [f64; 3]) -> Segment {
        let samples = coverages.iter()
            .map(|&depth| SegmentSample::new(vec![depth; 8], Vec::new()))
            .collect();
        Segment::new(GenomicRange::new("chr1", 0, 10_000).expect("valid range"), samples)
    }

    fn fixtures(pedigree: &Pedigree, params: &CallerParams) -> (TransitionMatrix, Vec<Vec<Genotype>>) {
        let transition = TransitionMatrix::new(params.max_copy_number);
        let parental = parental_genotypes(params.max_copy_number);
        let mut rng = fastrand::Rng::with_seed(params.seed);
        let offspring = offspring_genotypes(
            &parental,
            pedigree.proband_count(),
            params.max_offspring_genotypes,
            &mut rng,
        );
        (transition, offspring)
    }

    #[test]
    fn uniform_diploid_coverage_calls_diploid_everywhere() -> Result<(), CallerError> {
        let pedigree = trio().map_err(CallerError::Pedigree)?;
        let params = CallerParams::default();
        let (transition, offspring) = fixtures(&pedigree, &params);
        let mut segment = trio_segment([30.0, 30.0, 30.0]);
        let dist = call_joint_segment(&mut segment, &pedigree, &transition, &offspring, &params)?;
        assert_eq!(segment.copy_numbers(), vec![2, 2, 2]);
        assert!(dist.peak() > 0.0);
        Ok(())
    }

    #[test]
    fn half_coverage_in_the_child_calls_a_deletion() -> Result<(), CallerError> {
        let pedigree = trio().map_err(CallerError::Pedigree)?;
        let params = CallerParams::default();
        let (transition, offspring) = fixtures(&pedigree, &params);
        let mut segment = trio_segment([15.0, 30.0, 30.0]);
        call_joint_segment(&mut segment, &pedigree, &transition, &offspring, &params)?;
        assert_eq!(segment.copy_numbers(), vec![1, 2, 2]);
        Ok(())
    }

    #[test]
    fn peak_equals_the_likelihood_at_the_argmax_tuple() -> Result<(), CallerError> {
        let pedigree = trio().map_err(CallerError::Pedigree)?;
        let params = CallerParams::default();
        let (transition, offspring) = fixtures(&pedigree, &params);
        let mut segment = trio_segment([15.0, 30.0, 30.0]);
        let dist = call_joint_segment(&mut segment, &pedigree, &transition, &offspring, &params)?;

        // Reconstruct the product at the recorded argmax.
        let child_cov = pedigree.sample(0).capped_coverage(segment.coverage(0, params.number_of_trimmed_bins));
        let parent_cov = pedigree.sample(1).capped_coverage(segment.coverage(1, params.number_of_trimmed_bins));
        let child = pedigree.sample(0).model().depth_likelihoods(child_cov);
        let parent = pedigree.sample(1).model().depth_likelihoods(parent_cov);
        // Best transmission for a single-copy child of diploid parents: one
        // parent passes one copy, the other passes zero.
        let expected = parent[2] * parent[2]
            * transition.probability(2, 1) * transition.probability(2, 0)
            * child[1];
        assert_approx_eq!(f64, dist.peak(), expected, epsilon = 1e-15);
        assert_approx_eq!(f64, dist.get(&[2, 2, 1]), expected, epsilon = 1e-15);
        Ok(())
    }

    #[test]
    fn childless_pedigrees_reduce_to_independent_argmaxes() -> Result<(), CallerError> {
        // A two-axis sweep driven by a single empty offspring combination.
        let pedigree = trio().map_err(CallerError::Pedigree)?;
        let params = CallerParams::default();
        let transition = TransitionMatrix::new(params.max_copy_number);
        let offspring = vec![Vec::new()];
        let mut segment = trio_segment([30.0, 45.0, 15.0]);
        let dist = call_joint_segment(&mut segment, &pedigree, &transition, &offspring, &params)?;

        // Parents argmax independently; the child slot keeps its reset state.
        assert_eq!(segment.samples[1].call.copy_number, 3);
        assert_eq!(segment.samples[2].call.copy_number, 1);
        assert_eq!(segment.samples[0].call.copy_number, 2);
        assert_eq!(dist.axes(), 2);
        Ok(())
    }

    #[test]
    fn parent_swap_leaves_assignments_unchanged() -> Result<(), CallerError> {
        let params = CallerParams::default();
        let forward = Pedigree::new(vec![
            sample("father", Kinship::Parent, 30.0),
            sample("mother", Kinship::Parent, 30.0),
            sample("child",  Kinship::Proband, 30.0),
        ]).map_err(CallerError::Pedigree)?;
        let swapped = Pedigree::new(vec![
            sample("mother", Kinship::Parent, 30.0),
            sample("father", Kinship::Parent, 30.0),
            sample("child",  Kinship::Proband, 30.0),
        ]).map_err(CallerError::Pedigree)?;

        // Father duplicated, mother diploid, child inherits the duplication.
        let (transition, offspring) = fixtures(&forward, &params);
        let mut forward_segment = trio_segment([45.0, 45.0, 30.0]);
        call_joint_segment(&mut forward_segment, &forward, &transition, &offspring, &params)?;

        // In the swapped pedigree the same data lands on swapped parent slots.
        let mut swapped_segment = trio_segment([45.0, 30.0, 45.0]);
        call_joint_segment(&mut swapped_segment, &swapped, &transition, &offspring, &params)?;

        assert_eq!(forward_segment.samples[0].call.copy_number, swapped_segment.samples[0].call.copy_number);
        assert_eq!(forward_segment.samples[1].call.copy_number, swapped_segment.samples[2].call.copy_number);
        assert_eq!(forward_segment.samples[2].call.copy_number, swapped_segment.samples[1].call.copy_number);
        Ok(())
    }

    #[test]
    fn coverage_is_capped_before_evaluation() -> Result<(), CallerError> {
        let pedigree = trio().map_err(CallerError::Pedigree)?;
        let params = CallerParams::default();
        let (transition, offspring) = fixtures(&pedigree, &params);
        // A collapsed repeat: wildly deep child coverage caps at 90 and calls
        // the top modeled state rather than feeding 600x into the Gaussians.
        let mut segment = trio_segment([600.0, 30.0, 30.0]);
        call_joint_segment(&mut segment, &pedigree, &transition, &offspring, &params)?;
        assert_eq!(segment.samples[0].call.copy_number, 4);
        Ok(())
    }
}
