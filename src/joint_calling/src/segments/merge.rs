use super::{Segment, SegmentSet};
use crate::{error::CallerError, params::CallerParams};

/// Collect the selected-haplotype segments of every set and merge adjacent
/// segments whose per-sample copy-number vectors agree, provided they are
/// separated by at most `max_merge_gap` base pairs. Merged segments average
/// the quality scores of their inputs; calls shorter than
/// `minimum_call_size` receive a size filter label.
///
/// The operation is stable: feeding its output back through the adjacency
/// merge yields the same list.
pub fn merge_segment_sets(
    sets: &[SegmentSet],
    params: &CallerParams,
) -> Result<Vec<Segment>, CallerError> {
    let mut segments = Vec::new();
    for set in sets {
        let selected = set.selected_segments()
            .ok_or_else(|| CallerError::UnselectedSegmentSet(set.span().to_string()))?;
        segments.extend_from_slice(selected);
    }
    segments.sort_by(|left, right| left.range.cmp(&right.range));

    let mut merged = merge_adjacent(segments, params.max_merge_gap);
    let size_label = format!("L{}", params.minimum_call_size);
    for segment in &mut merged {
        if segment.range.len() < params.minimum_call_size {
            for slot in &mut segment.samples {
                slot.call.push_filter(&size_label);
            }
        }
    }
    Ok(merged)
}

/// One merge accumulator: the segment being grown, plus enough bookkeeping to
/// average scores over its constituents.
struct Accumulator {
    segment: Segment,
    members: usize,
    qs_sums: Vec<f64>,
    dqs_sums: Vec<Option<f64>>,
}

impl Accumulator {
    fn new(segment: Segment) -> Self {
        let qs_sums = segment.samples.iter().map(|slot| slot.call.quality_score).collect();
        let dqs_sums = segment.samples.iter().map(|slot| slot.call.de_novo_quality).collect();
        Self{segment, members: 1, qs_sums, dqs_sums}
    }

    fn absorb(&mut self, other: Segment) {
        self.segment.range.end = other.range.end;
        self.members += 1;
        for (s, slot) in other.samples.into_iter().enumerate() {
            self.qs_sums[s] += slot.call.quality_score;
            self.dqs_sums[s] = match (self.dqs_sums[s], slot.call.de_novo_quality) {
                (Some(sum), Some(dqs)) => Some(sum + dqs),
                _ => None,
            };
            // MCC survives a merge only when every constituent agrees.
            let ours = &mut self.segment.samples[s];
            if ours.call.major_chromosome_count != slot.call.major_chromosome_count {
                ours.call.major_chromosome_count = None;
            }
            ours.bin_depths.extend(slot.bin_depths);
            ours.alleles.extend(slot.alleles);
        }
    }

    fn finish(mut self) -> Segment {
        for (s, slot) in self.segment.samples.iter_mut().enumerate() {
            slot.call.quality_score = self.qs_sums[s] / self.members as f64;
            slot.call.de_novo_quality = self.dqs_sums[s].map(|sum| sum / self.members as f64);
        }
        self.segment
    }
}

fn merge_adjacent(segments: Vec<Segment>, max_merge_gap: u32) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    let mut current: Option<Accumulator> = None;

    for segment in segments {
        match current.take() {
            None => current = Some(Accumulator::new(segment)),
            Some(mut acc) => {
                let mergeable = acc.segment.range
                    .gap_to(&segment.range)
                    .is_some_and(|gap| gap <= max_merge_gap)
                    && acc.segment.copy_numbers() == segment.copy_numbers();
                if mergeable {
                    acc.absorb(segment);
                    current = Some(acc);
                } else {
                    merged.push(acc.finish());
                    current = Some(Accumulator::new(segment));
                }
            },
        }
    }
    if let Some(acc) = current {
        merged.push(acc.finish());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::{SegmentSample, Haplotype};
    use genome::GenomicRange;

    fn called_segment(begin: u32, end: u32, copy_numbers: &[usize], quality: f64) -> Segment {
        let samples = copy_numbers.iter().map(|&cn| {
            let mut slot = SegmentSample::new(vec![30.0; 4], Vec::new());
            slot.call.copy_number = cn;
            slot.call.quality_score = quality;
            slot
        }).collect();
        Segment::new(GenomicRange::new("chr1", begin, end).expect("valid range"), samples)
    }

    fn selected_sets(segments: Vec<Segment>) -> Vec<SegmentSet> {
        segments.into_iter().map(|segment| {
            let mut set = SegmentSet::single(segment);
            set.select(Haplotype::A);
            set
        }).collect()
    }

    #[test]
    fn adjacent_identical_calls_collapse_and_average_quality() -> Result<(), CallerError> {
        let sets = selected_sets(vec![
            called_segment(0, 10_000, &[2, 2, 1], 30.0),
            called_segment(10_000, 20_000, &[2, 2, 1], 40.0),
            called_segment(20_000, 30_000, &[2, 2, 1], 50.0),
        ]);
        let merged = merge_segment_sets(&sets, &CallerParams::default())?;
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].range, GenomicRange::new("chr1", 0, 30_000)?);
        for slot in &merged[0].samples {
            assert!((slot.call.quality_score - 40.0).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn differing_copy_numbers_block_the_merge() -> Result<(), CallerError> {
        let sets = selected_sets(vec![
            called_segment(0, 10_000, &[2, 2], 30.0),
            called_segment(10_000, 20_000, &[2, 3], 30.0),
        ]);
        let merged = merge_segment_sets(&sets, &CallerParams::default())?;
        assert_eq!(merged.len(), 2);
        Ok(())
    }

    #[test]
    fn wide_gaps_block_the_merge() -> Result<(), CallerError> {
        let sets = selected_sets(vec![
            called_segment(0, 10_000, &[2], 30.0),
            called_segment(30_000, 40_000, &[2], 30.0), // 20 kb gap
        ]);
        let merged = merge_segment_sets(&sets, &CallerParams::default())?;
        assert_eq!(merged.len(), 2);
        Ok(())
    }

    #[test]
    fn merging_is_stable() -> Result<(), CallerError> {
        let sets = selected_sets(vec![
            called_segment(0, 10_000, &[2, 1], 30.0),
            called_segment(10_000, 20_000, &[2, 1], 40.0),
            called_segment(25_000, 30_000, &[2, 2], 20.0),
        ]);
        let params = CallerParams::default();
        let once = merge_segment_sets(&sets, &params)?;
        let twice = merge_segment_sets(&selected_sets(once.clone()), &params)?;
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn short_calls_receive_a_size_filter() -> Result<(), CallerError> {
        let sets = selected_sets(vec![called_segment(0, 500, &[1], 30.0)]);
        let merged = merge_segment_sets(&sets, &CallerParams::default())?;
        assert_eq!(merged[0].samples[0].call.filter.as_deref(), Some("L2000"));
        Ok(())
    }

    #[test]
    fn unselected_sets_are_rejected() {
        let sets = vec![SegmentSet::single(called_segment(0, 10_000, &[2], 30.0))];
        assert!(merge_segment_sets(&sets, &CallerParams::default()).is_err());
    }
}
