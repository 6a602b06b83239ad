use crate::{
    distribution::CopyNumberDistribution,
    genotype::cn_allele_set,
    params::CallerParams,
    pedigree::Pedigree,
    segments::Segment,
};

/// The copy-number state treated as the baseline of the de-novo contrast.
/// Kept diploid on every chromosome: haploid regions therefore understate
/// de-novo quality, a known approximation.
const REFERENCE_STATE: usize = 2;

/// Phred-scale the evidence for `copy_number` within a likelihood vector:
/// `-10·log10((Σv - v[cn]) / Σv)`, clipped to `[0, max_q_score]`.
///
/// Degenerate vectors (empty, all-zero, non-finite mass) score 0; a vector
/// whose whole mass sits on `copy_number` scores `max_q_score`.
#[must_use]
pub fn phred_quality(likelihoods: &[f64], copy_number: usize, max_q_score: f64) -> f64 {
    if likelihoods.is_empty() {
        return 0.0
    }
    let state = copy_number.min(likelihoods.len() - 1);
    let total: f64 = likelihoods.iter().sum();
    let residual = (total - likelihoods[state]) / total;
    if !residual.is_finite() {
        return 0.0
    }
    if residual <= 0.0 {
        return max_q_score
    }
    (-10.0 * residual.log10()).clamp(0.0, max_q_score)
}

/// Score one called segment of a pedigree run: per-sample quality from the
/// joint-distribution marginals, then conditional de-novo quality on the
/// probands, then filter labels.
pub(crate) fn score_joint_segment(
    segment: &mut Segment,
    distribution: &CopyNumberDistribution,
    pedigree: &Pedigree,
    params: &CallerParams,
) {
    for index in 0..pedigree.len() {
        let marginal = distribution.marginal(pedigree.axis_of(index));
        let copy_number = segment.samples[index].call.copy_number;
        segment.samples[index].call.quality_score =
            phred_quality(&marginal, copy_number, params.max_q_score);
    }
    for proband in pedigree.proband_indices() {
        let quality = de_novo_quality(segment, distribution, pedigree, proband, params);
        segment.samples[proband].call.de_novo_quality = quality;
    }
    apply_quality_filters(segment, params);
}

/// Score one called segment of a cohort run from the per-sample restricted
/// likelihood vectors.
pub(crate) fn score_cohort_segment(
    segment: &mut Segment,
    restricted: &[Vec<f64>],
    params: &CallerParams,
) {
    for (slot, likelihoods) in segment.samples.iter_mut().zip(restricted) {
        slot.call.quality_score =
            phred_quality(likelihoods, slot.call.copy_number, params.max_q_score);
    }
    apply_quality_filters(segment, params);
}

fn apply_quality_filters(segment: &mut Segment, params: &CallerParams) {
    let quality_label = format!("q{}", params.quality_filter_threshold);
    let de_novo_label = format!("dq{}", params.de_novo_quality_filter_threshold);
    for slot in &mut segment.samples {
        if slot.call.quality_score < params.quality_filter_threshold {
            slot.call.push_filter(&quality_label);
        }
        if slot.call.de_novo_quality
            .is_some_and(|dqs| dqs < params.de_novo_quality_filter_threshold)
        {
            slot.call.push_filter(&de_novo_label);
        }
    }
}

/// Conditional de-novo quality of one proband's call.
///
/// Returns `None` unless the call departs from the proband's expected ploidy
/// while the family context supports a de-novo interpretation: parents at
/// their expected ploidies (or the event not being population-common), every
/// sibling either reference or likewise not-common, and confident calls on
/// the trio of interest.
fn de_novo_quality(
    segment: &Segment,
    distribution: &CopyNumberDistribution,
    pedigree: &Pedigree,
    proband: usize,
    params: &CallerParams,
) -> Option<f64> {
    let range = &segment.range;
    let call_cn = segment.samples[proband].call.copy_number;
    let expected = pedigree.sample(proband).expected_ploidy(range);
    if call_cn == expected {
        return None
    }

    let parent_indices = [pedigree.parent1_index(), pedigree.parent2_index()];
    let is_reference = |index: usize| {
        segment.samples[index].call.copy_number == pedigree.sample(index).expected_ploidy(range)
    };
    let shared_with_parent = |cn: usize, ploidy: usize| {
        parent_indices.iter().any(|&parent| is_common_cnv(
            cn,
            ploidy,
            segment.samples[parent].call.copy_number,
            pedigree.sample(parent).expected_ploidy(range),
        ))
    };

    let parents_reference = parent_indices.iter().all(|&parent| is_reference(parent));
    if !parents_reference && shared_with_parent(call_cn, expected) {
        return None
    }
    for sibling in pedigree.proband_indices().filter(|&s| s != proband) {
        let sibling_cn = segment.samples[sibling].call.copy_number;
        let sibling_ploidy = pedigree.sample(sibling).expected_ploidy(range);
        if sibling_cn != sibling_ploidy && shared_with_parent(sibling_cn, sibling_ploidy) {
            return None
        }
    }

    let confident = |index: usize| {
        segment.samples[index].call.quality_score > params.quality_filter_threshold
    };
    if !(confident(proband) && parent_indices.iter().all(|&parent| confident(parent))) {
        return None
    }

    // P(everyone else at baseline | proband at its called state).
    let axis = pedigree.axis_of(proband);
    let mut baseline_index = vec![REFERENCE_STATE; distribution.axes()];
    baseline_index[axis] = call_cn;
    let numerator = distribution.get(&baseline_index);
    let marginal = distribution.marginal(axis);
    let denominator = marginal[call_cn.min(marginal.len() - 1)];
    let inherited_fraction = if denominator > 0.0 { numerator / denominator } else { 0.0 };

    let baseline_mass = marginal[REFERENCE_STATE];
    let alt_mass = marginal[call_cn.min(marginal.len() - 1)];
    let marginal_alt = if alt_mass + baseline_mass > 0.0 {
        alt_mass / (alt_mass + baseline_mass)
    } else {
        0.0
    };

    let mut de_novo = (1.0 - inherited_fraction) * (1.0 - marginal_alt);
    if !de_novo.is_finite() {
        de_novo = 0.0;
    }
    let quality = -10.0 * de_novo.max(params.de_novo_rate).log10();
    Some(quality.clamp(0.0, params.max_q_score))
}

/// A call shared between a proband and a non-reference parent of the same
/// expected ploidy, with intersecting allele sets: population-common rather
/// than de novo.
fn is_common_cnv(proband_cn: usize, proband_ploidy: usize, parent_cn: usize, parent_ploidy: usize) -> bool {
    parent_cn != parent_ploidy
        && proband_ploidy == parent_ploidy
        && cn_allele_set(parent_cn).iter().any(|allele| cn_allele_set(proband_cn).contains(allele))
}
