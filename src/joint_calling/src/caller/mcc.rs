use log::trace;

use crate::{
    genotype::Genotype,
    params::CallerParams,
    pedigree::{Pedigree, Sample},
    segments::Segment,
};

/// Decide whether a segment carries enough allele evidence for major
/// chromosome counts to be assigned from B-allele frequencies.
///
/// Allele density, the per-segment observation cap and the sample coverage
/// are evaluated for diagnostics, but the decision rests on the heterozygous
/// observation count alone: one sample under the threshold disables allele
/// evidence for the whole segment.
#[must_use]
pub fn use_allele_information(segment: &Segment, samples: &[&Sample], params: &CallerParams) -> bool {
    let kilobases = f64::from(segment.range.len()) / 1000.0;
    let mut usable = true;
    for (slot, sample) in segment.samples.iter().zip(samples) {
        let heterozygous = slot.heterozygous_count();
        let density = heterozygous as f64 / kilobases;
        let shallow = sample.mean_coverage() < params.median_coverage_threshold;
        trace!(
            "allele evidence for {} over {}: {heterozygous} het sites, {density:.3}/kb{}{}{}",
            sample.name(),
            segment.range,
            if density < params.allele_density_threshold { " (sparse)" } else { "" },
            if slot.alleles.len() > params.per_segment_allele_max_counts { " (capped)" } else { "" },
            if shallow { " (shallow)" } else { "" },
        );
        if heterozygous < params.read_counts_threshold {
            usable = false;
        }
    }
    usable
}

/// Major chromosome count implied by a genotype at a given copy number. Below
/// three copies the split is unambiguous and the genotype is not consulted.
fn major_count(copy_number: usize, genotype: Genotype) -> usize {
    match copy_number {
        0 | 1 => copy_number,
        2 => 1,
        _ => genotype.major_count(),
    }
}

/// An offspring genotype can be transmitted by a parent genotype when they
/// share at least one per-haplotype allele count.
fn transmission_consistent(child: Genotype, parent: Genotype) -> bool {
    parent.count_a == child.count_a
        || parent.count_a == child.count_b
        || parent.count_b == child.count_a
        || parent.count_b == child.count_b
}

/// Assign major chromosome counts across a pedigree from allele evidence.
///
/// Parental genotype pairs are enumerated jointly; every inherited proband
/// contributes its best transmission-consistent genotype, and the overall
/// argmax fixes each sample's count. Probands flagged de novo on this
/// segment are excluded from the joint product and fall back to the
/// independent rule.
pub fn assign_pedigree_mcc(
    segment: &mut Segment,
    pedigree: &Pedigree,
    genotype_tables: &[Vec<Genotype>],
    params: &CallerParams,
) {
    let parent1 = pedigree.parent1_index();
    let parent2 = pedigree.parent2_index();
    let cn1 = segment.samples[parent1].call.copy_number;
    let cn2 = segment.samples[parent2].call.copy_number;

    let parent_alleles = |index: usize| {
        segment.samples[index].capped_alleles(params.per_segment_allele_max_counts)
    };

    let mut best_likelihood = 0.0;
    let mut best: Option<(Genotype, Genotype, Vec<Option<Genotype>>)> = None;

    for &gt1 in &genotype_tables[cn1] {
        for &gt2 in &genotype_tables[cn2] {
            let mut likelihood = pedigree.sample(parent1).model()
                .genotype_likelihood(parent_alleles(parent1), gt1)
                * pedigree.sample(parent2).model()
                    .genotype_likelihood(parent_alleles(parent2), gt2);
            let mut choices: Vec<Option<Genotype>> = Vec::with_capacity(pedigree.proband_count());

            for proband in pedigree.proband_indices() {
                if segment.samples[proband].call.de_novo_quality.is_some() {
                    choices.push(None);
                    continue
                }
                let child_cn = segment.samples[proband].call.copy_number;
                let alleles = segment.samples[proband]
                    .capped_alleles(params.per_segment_allele_max_counts);
                let best_child = genotype_tables[child_cn].iter()
                    .filter(|&&gt| transmission_consistent(gt, gt1) && transmission_consistent(gt, gt2))
                    .map(|&gt| (gt, pedigree.sample(proband).model().genotype_likelihood(alleles, gt)))
                    .max_by(|(_, a), (_, b)| a.total_cmp(b));
                match best_child {
                    Some((genotype, child_likelihood)) => {
                        likelihood *= child_likelihood;
                        choices.push(Some(genotype));
                    },
                    None => {
                        likelihood = 0.0;
                        break
                    },
                }
            }

            if likelihood > best_likelihood {
                best_likelihood = likelihood;
                best = Some((gt1, gt2, choices));
            }
        }
    }

    if let Some((gt1, gt2, choices)) = best {
        segment.samples[parent1].call.major_chromosome_count = Some(major_count(cn1, gt1));
        segment.samples[parent2].call.major_chromosome_count = Some(major_count(cn2, gt2));
        for (proband, choice) in pedigree.proband_indices().zip(choices) {
            if let Some(genotype) = choice {
                let child_cn = segment.samples[proband].call.copy_number;
                segment.samples[proband].call.major_chromosome_count =
                    Some(major_count(child_cn, genotype));
            }
        }
    }

    // De-novo probands (and everyone left unassigned by a degenerate joint
    // product) carry counts from their own evidence.
    for index in 0..segment.samples.len() {
        if segment.samples[index].call.major_chromosome_count.is_none() {
            assign_sample_mcc(segment, index, pedigree.sample(index), genotype_tables, params);
        }
    }
}

/// Assign major chromosome counts independently per sample, from each
/// sample's own allele evidence.
pub fn assign_cohort_mcc(
    segment: &mut Segment,
    samples: &[&Sample],
    genotype_tables: &[Vec<Genotype>],
    params: &CallerParams,
) {
    for (index, &sample) in samples.iter().enumerate() {
        assign_sample_mcc(segment, index, sample, genotype_tables, params);
    }
}

fn assign_sample_mcc(
    segment: &mut Segment,
    index: usize,
    sample: &Sample,
    genotype_tables: &[Vec<Genotype>],
    params: &CallerParams,
) {
    let copy_number = segment.samples[index].call.copy_number;
    let count = if copy_number > 2 {
        let alleles = segment.samples[index].capped_alleles(params.per_segment_allele_max_counts);
        let candidates = &genotype_tables[copy_number];
        match sample.model().best_genotype(alleles, candidates) {
            Some(best) => candidates[best.index].major_count(),
            None => return,
        }
    } else {
        major_count(copy_number, Genotype::new(0, 0))
    };
    segment.samples[index].call.major_chromosome_count = Some(count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GaussianCoverageModel;
    use crate::pedigree::{Kinship, PedigreeError};
    use crate::segments::{AlleleCount, SegmentSample};
    use genome::{GenomicRange, PloidyMap};

    fn sample(name: &str, kin: Kinship) -> Sample {
        let model = Box::new(GaussianCoverageModel::new(30.0, 5));
        Sample::new(name, kin, 30.0, PloidyMap::default(), model)
    }

    fn trio() -> Result<Pedigree, PedigreeError> {
        Pedigree::new(vec![
            sample("father", Kinship::Parent),
            sample("mother", Kinship::Parent),
            sample("child",  Kinship::Proband),
        ])
    }

    /// Working order: child, father, mother.
    fn trio_segment(copy_numbers: [usize; 3], alleles: [Vec<AlleleCount>; 3]) -> Segment {
        let samples = copy_numbers.iter().zip(alleles)
            .map(|(&cn, counts)| {
                let mut slot = SegmentSample::new(vec![30.0; 4], counts);
                slot.call.copy_number = cn;
                slot
            })
            .collect();
        Segment::new(GenomicRange::new("chr1", 0, 10_000).expect("valid range"), samples)
    }

    fn balanced(n: usize) -> Vec<AlleleCount> {
        vec![AlleleCount::new(15, 15); n]
    }

    fn skewed(n: usize) -> Vec<AlleleCount> {
        vec![AlleleCount::new(30, 15); n]
    }

    #[test]
    fn sparse_allele_evidence_disables_the_assignment() -> Result<(), PedigreeError> {
        let pedigree = trio()?;
        let samples: Vec<&Sample> = pedigree.samples().iter().collect();
        let params = CallerParams::default();

        // One sample under the heterozygous-count threshold spoils the segment.
        let segment = trio_segment([2, 2, 2], [balanced(8), balanced(8), balanced(2)]);
        assert!(!use_allele_information(&segment, &samples, &params));

        // Empty observation lists everywhere: same outcome.
        let empty = trio_segment([2, 2, 2], [vec![], vec![], vec![]]);
        assert!(!use_allele_information(&empty, &samples, &params));

        let usable = trio_segment([2, 2, 2], [balanced(8), balanced(8), balanced(8)]);
        assert!(use_allele_information(&usable, &samples, &params));
        Ok(())
    }

    #[test]
    fn diploid_trio_settles_on_balanced_counts() -> Result<(), PedigreeError> {
        let pedigree = trio()?;
        let params = CallerParams::default();
        let mut segment = trio_segment([2, 2, 2], [balanced(8), balanced(8), balanced(8)]);
        assign_pedigree_mcc(&mut segment, &pedigree, &crate::genotype::genotypes_by_cn(5), &params);
        for slot in &segment.samples {
            assert_eq!(slot.call.major_chromosome_count, Some(1));
        }
        Ok(())
    }

    #[test]
    fn inherited_duplication_takes_the_skewed_genotype() -> Result<(), PedigreeError> {
        let pedigree = trio()?;
        let params = CallerParams::default();
        // Father and child both duplicated, with one-third B-allele reads.
        let mut segment = trio_segment([3, 3, 2], [skewed(8), skewed(8), balanced(8)]);
        assign_pedigree_mcc(&mut segment, &pedigree, &crate::genotype::genotypes_by_cn(5), &params);
        assert_eq!(segment.samples[0].call.major_chromosome_count, Some(2)); // child
        assert_eq!(segment.samples[1].call.major_chromosome_count, Some(2)); // father
        assert_eq!(segment.samples[2].call.major_chromosome_count, Some(1)); // mother
        Ok(())
    }

    #[test]
    fn low_copy_states_need_no_genotype_evidence() -> Result<(), PedigreeError> {
        let pedigree = trio()?;
        let params = CallerParams::default();
        let mut segment = trio_segment([1, 2, 2], [balanced(8), balanced(8), balanced(8)]);
        // A deletion has no heterozygous sites of its own; keep the evidence
        // lists populated to isolate the count rule.
        assign_pedigree_mcc(&mut segment, &pedigree, &crate::genotype::genotypes_by_cn(5), &params);
        assert_eq!(segment.samples[0].call.major_chromosome_count, Some(1));
        Ok(())
    }

    #[test]
    fn cohort_assignment_is_independent_per_sample() -> Result<(), PedigreeError> {
        let pedigree = trio()?;
        let samples: Vec<&Sample> = pedigree.samples().iter().collect();
        let params = CallerParams::default();
        let mut segment = trio_segment([3, 0, 2], [skewed(8), balanced(8), balanced(8)]);
        assign_cohort_mcc(&mut segment, &samples, &crate::genotype::genotypes_by_cn(5), &params);
        assert_eq!(segment.samples[0].call.major_chromosome_count, Some(2));
        assert_eq!(segment.samples[1].call.major_chromosome_count, Some(0));
        assert_eq!(segment.samples[2].call.major_chromosome_count, Some(1));
        Ok(())
    }
}
