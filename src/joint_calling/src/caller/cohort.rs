use crate::{error::CallerError, params::CallerParams, pedigree::Sample, segments::Segment};

/// Outcome of an independent (no-pedigree) segment call: the summed score of
/// the winning copy-number combination, plus each sample's likelihood vector
/// restricted to that combination's states.
#[derive(Debug)]
pub struct CohortScore {
    pub total: f64,
    pub restricted: Vec<Vec<f64>>,
}

/// Call one segment across unrelated samples.
///
/// Every copy-number combination is scored as the sum, over samples, of the
/// best in-combination depth likelihood; the first combination reaching the
/// highest total wins (combinations are ordered smallest first, so singleton
/// states win ties against their supersets). Each sample then takes the
/// in-combination state its own likelihoods prefer, lowest state first on
/// ties.
pub fn call_cohort_segment(
    segment: &mut Segment,
    samples: &[&Sample],
    combinations: &[Vec<usize>],
    params: &CallerParams,
) -> Result<CohortScore, CallerError> {
    if segment.samples.len() != samples.len() {
        return Err(CallerError::SampleCountMismatch{
            context: "calling a cohort segment",
            expected: samples.len(),
            found: segment.samples.len(),
        })
    }

    for slot in &mut segment.samples {
        slot.call.copy_number = 2;
    }

    let mut likelihoods = Vec::with_capacity(samples.len());
    for (index, sample) in samples.iter().enumerate() {
        let coverage = segment.coverage(index, params.number_of_trimmed_bins);
        if coverage < 0.0 {
            return Err(CallerError::NegativeCoverage{
                sample: sample.name().to_string(),
                range: segment.range.to_string(),
                coverage,
            })
        }
        let vector = sample.model().depth_likelihoods(sample.capped_coverage(coverage));
        if vector.is_empty() {
            return Err(CallerError::EmptyLikelihoods(sample.name().to_string()))
        }
        likelihoods.push(vector);
    }

    // Lone sample (or no combinations to sweep): a plain argmax over all
    // states, ties toward the lower one.
    if samples.len() == 1 || combinations.is_empty() {
        let mut total = 0.0;
        for (index, vector) in likelihoods.iter().enumerate() {
            let best = argmax_low(vector, 0..vector.len());
            segment.samples[index].call.copy_number = best;
            total += sanitize(vector[best]);
        }
        return Ok(CohortScore{total, restricted: likelihoods})
    }

    let mut best_total = f64::NEG_INFINITY;
    let mut best_combination: &[usize] = &combinations[0];
    for combination in combinations {
        let total: f64 = likelihoods.iter()
            .map(|vector| combination.iter()
                .map(|&state| sanitize(vector[state]))
                .fold(0.0f64, f64::max))
            .sum();
        if total > best_total {
            best_total = total;
            best_combination = combination;
        }
    }

    let mut restricted = Vec::with_capacity(samples.len());
    for (index, vector) in likelihoods.iter().enumerate() {
        let state = argmax_low(vector, best_combination.iter().copied());
        segment.samples[index].call.copy_number = state;
        let mut masked = vec![0.0; vector.len()];
        for &allowed in best_combination {
            masked[allowed] = sanitize(vector[allowed]);
        }
        restricted.push(masked);
    }
    Ok(CohortScore{total: best_total, restricted})
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Argmax over the provided states, preferring the lowest state on ties.
fn argmax_low(vector: &[f64], states: impl IntoIterator<Item = usize>) -> usize {
    let mut best_state = 2usize.min(vector.len() - 1);
    let mut best_value = f64::NEG_INFINITY;
    for state in states {
        let value = sanitize(vector[state]);
        if value > best_value {
            best_value = value;
            best_state = state;
        }
    }
    best_state
}
