use genome::{GenomicRange, RegionSet};

use crate::error::CallerError;

mod merge;
pub use merge::merge_segment_sets;

/// One SNV observation: read counts supporting the A and B alleles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlleleCount {
    pub a: u32,
    pub b: u32,
}

impl AlleleCount {
    #[must_use]
    pub const fn new(a: u32, b: u32) -> Self {
        Self{a, b}
    }

    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.a + self.b
    }

    /// Whether both alleles are supported by at least one read.
    #[must_use]
    pub const fn is_heterozygous(&self) -> bool {
        self.a > 0 && self.b > 0
    }
}

/// Mutable call state of one sample over one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCall {
    pub copy_number: usize,
    pub major_chromosome_count: Option<usize>,
    pub quality_score: f64,
    pub de_novo_quality: Option<f64>,
    pub filter: Option<String>,
}

impl Default for SegmentCall {
    fn default() -> Self {
        Self {
            copy_number: 2,
            major_chromosome_count: None,
            quality_score: 0.0,
            de_novo_quality: None,
            filter: None,
        }
    }
}

impl SegmentCall {
    /// Append a filter label, keeping any label already present.
    pub fn push_filter(&mut self, label: &str) {
        match &mut self.filter {
            Some(existing) if existing.split(';').any(|tag| tag == label) => (),
            Some(existing) => *existing = format!("{existing};{label}"),
            None => self.filter = Some(label.to_string()),
        }
    }
}

/// Per-sample payload of one segment: binned depth observations, SNV allele
/// observations, and the call state the inference pass writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSample {
    pub bin_depths: Vec<f64>,
    pub alleles: Vec<AlleleCount>,
    pub call: SegmentCall,
}

impl SegmentSample {
    #[must_use]
    pub fn new(bin_depths: Vec<f64>, alleles: Vec<AlleleCount>) -> Self {
        Self{bin_depths, alleles, call: SegmentCall::default()}
    }

    /// Number of heterozygous SNV observations.
    #[must_use]
    pub fn heterozygous_count(&self) -> usize {
        self.alleles.iter().filter(|count| count.is_heterozygous()).count()
    }

    /// Allele observations entering the likelihoods, capped at `max_counts`.
    #[must_use]
    pub fn capped_alleles(&self, max_counts: usize) -> &[AlleleCount] {
        &self.alleles[..self.alleles.len().min(max_counts)]
    }
}

/// A candidate genomic segment, carrying one [`SegmentSample`] per sample.
///
/// The sample axis is ordered identically across every segment of a run
/// (probands first, parents last). Segments are mutated only by the inference
/// pass that owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub range: GenomicRange,
    pub samples: Vec<SegmentSample>,
}

impl Segment {
    #[must_use]
    pub fn new(range: GenomicRange, samples: Vec<SegmentSample>) -> Self {
        Self{range, samples}
    }

    /// Segment coverage of one sample: the median of its per-bin depths after
    /// `trimmed_bins` bins are dropped from each flank (whenever enough bins
    /// remain for trimming to leave at least one).
    #[must_use]
    pub fn coverage(&self, sample: usize, trimmed_bins: usize) -> f64 {
        let depths = &self.samples[sample].bin_depths;
        if depths.len() > 2 * trimmed_bins + 1 {
            median(&depths[trimmed_bins..depths.len() - trimmed_bins])
        } else {
            median(depths)
        }
    }

    /// The per-sample copy-number vector of the current call state.
    #[must_use]
    pub fn copy_numbers(&self) -> Vec<usize> {
        self.samples.iter().map(|slot| slot.call.copy_number).collect()
    }
}

/// Median of a slice, 0.0 when empty. Even-length slices average the two
/// central values.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// One of the two alternative segmentations of a [`SegmentSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haplotype {
    A,
    B,
}

/// Two alternative segmentations of the same genomic span. At most one of
/// them realizes the final calls; the selector records its choice exactly
/// once in `selected`.
#[derive(Debug, Clone)]
pub struct SegmentSet {
    hap_a: Option<Vec<Segment>>,
    hap_b: Option<Vec<Segment>>,
    selected: Option<Haplotype>,
}

impl SegmentSet {
    /// Build a set from up to two alternative segmentations.
    ///
    /// # Errors
    /// - [`CallerError::EmptySegmentSet`] when both lists are absent or empty.
    /// - [`CallerError::HaplotypeExtentMismatch`] when both lists are present
    ///   but span different genomic extents.
    pub fn new(hap_a: Option<Vec<Segment>>, hap_b: Option<Vec<Segment>>) -> Result<Self, CallerError> {
        let hap_a = hap_a.filter(|segments| !segments.is_empty());
        let hap_b = hap_b.filter(|segments| !segments.is_empty());
        match (&hap_a, &hap_b) {
            (None, None) => return Err(CallerError::EmptySegmentSet(String::from("<no span>"))),
            (Some(a), Some(b)) => {
                let span_a = span_of(a);
                let span_b = span_of(b);
                if span_a != span_b {
                    return Err(CallerError::HaplotypeExtentMismatch{
                        hap_a: span_a.to_string(),
                        hap_b: span_b.to_string(),
                    })
                }
            },
            _ => (),
        }
        Ok(Self{hap_a, hap_b, selected: None})
    }

    /// Wrap a lone segment into a single-haplotype set.
    #[must_use]
    pub fn single(segment: Segment) -> Self {
        Self{hap_a: Some(vec![segment]), hap_b: None, selected: None}
    }

    #[must_use]
    pub fn haplotype(&self, which: Haplotype) -> Option<&[Segment]> {
        match which {
            Haplotype::A => self.hap_a.as_deref(),
            Haplotype::B => self.hap_b.as_deref(),
        }
    }

    pub fn haplotype_mut(&mut self, which: Haplotype) -> Option<&mut [Segment]> {
        match which {
            Haplotype::A => self.hap_a.as_deref_mut(),
            Haplotype::B => self.hap_b.as_deref_mut(),
        }
    }

    /// Record the selector's choice.
    pub fn select(&mut self, which: Haplotype) {
        self.selected = Some(which);
    }

    #[must_use]
    pub fn selected(&self) -> Option<Haplotype> {
        self.selected
    }

    /// Segments of the selected haplotype, once selection happened.
    #[must_use]
    pub fn selected_segments(&self) -> Option<&[Segment]> {
        self.haplotype(self.selected?)
    }

    /// Genomic span covered by this set.
    #[must_use]
    pub fn span(&self) -> GenomicRange {
        let segments = self.hap_a.as_deref()
            .or(self.hap_b.as_deref())
            .expect("a segment set always carries at least one haplotype");
        span_of(segments)
    }
}

fn span_of(segments: &[Segment]) -> GenomicRange {
    let first = &segments[0].range;
    let end = segments.iter().map(|segment| segment.range.end).max().unwrap_or(first.end);
    GenomicRange{chrom: first.chrom.clone(), begin: first.begin, end}
}

/// Partition candidate segments into segment sets.
///
/// Segments intersecting at least one region of `common_cnvs` become
/// two-haplotype sets: haplotype A keeps the segment whole, haplotype B
/// splits it at the region boundaries, apportioning bins and allele
/// observations to the pieces by length fraction. Everything else becomes a
/// single-haplotype set.
pub fn build_segment_sets(
    segments: Vec<Segment>,
    common_cnvs: &RegionSet,
) -> Result<Vec<SegmentSet>, CallerError> {
    let mut sets = Vec::with_capacity(segments.len());
    for segment in segments {
        let regions = common_cnvs.overlapping(&segment.range);
        if regions.is_empty() {
            sets.push(SegmentSet::single(segment));
            continue
        }

        let breakpoints: Vec<u32> = regions.iter()
            .flat_map(|region| [region.begin, region.end])
            .collect();
        let pieces = segment.range.split_at(&breakpoints);
        if pieces.len() < 2 {
            // Region swallows the segment whole: nothing to phase.
            sets.push(SegmentSet::single(segment));
            continue
        }

        let alternative = apportion(&segment, pieces);
        sets.push(SegmentSet::new(Some(vec![segment]), Some(alternative))?);
    }
    Ok(sets)
}

/// Distribute a segment's per-sample observations over contiguous pieces,
/// proportionally to piece length. The exchange format does not place single
/// SNVs, so allele observations are apportioned by count, in order.
fn apportion(segment: &Segment, pieces: Vec<GenomicRange>) -> Vec<Segment> {
    let total_len = f64::from(segment.range.len());
    let mut out = Vec::with_capacity(pieces.len());

    let mut bin_cursor = vec![0usize; segment.samples.len()];
    let mut allele_cursor = vec![0usize; segment.samples.len()];
    for (piece_idx, piece) in pieces.iter().enumerate() {
        let last = piece_idx + 1 == pieces.len();
        let fraction = f64::from(piece.len()) / total_len;

        let samples = segment.samples.iter().enumerate().map(|(s, slot)| {
            let bin_take = if last {
                slot.bin_depths.len() - bin_cursor[s]
            } else {
                ((slot.bin_depths.len() as f64 * fraction).round() as usize)
                    .min(slot.bin_depths.len() - bin_cursor[s])
            };
            let allele_take = if last {
                slot.alleles.len() - allele_cursor[s]
            } else {
                ((slot.alleles.len() as f64 * fraction).round() as usize)
                    .min(slot.alleles.len() - allele_cursor[s])
            };
            let bins = slot.bin_depths[bin_cursor[s]..bin_cursor[s] + bin_take].to_vec();
            let alleles = slot.alleles[allele_cursor[s]..allele_cursor[s] + allele_take].to_vec();
            bin_cursor[s] += bin_take;
            allele_cursor[s] += allele_take;
            SegmentSample::new(bins, alleles)
        }).collect();

        out.push(Segment::new(piece.clone(), samples));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(begin: u32, end: u32) -> GenomicRange {
        GenomicRange::new("chr1", begin, end).expect("valid test range")
    }

    fn uniform_segment(begin: u32, end: u32, depth: f64, bins: usize) -> Segment {
        Segment::new(range(begin, end), vec![SegmentSample::new(vec![depth; bins], Vec::new())])
    }

    #[test]
    fn trimmed_coverage_ignores_flank_bins() {
        let mut segment = uniform_segment(0, 10_000, 30.0, 10);
        // Boundary artifacts on both flanks.
        segment.samples[0].bin_depths[0] = 500.0;
        segment.samples[0].bin_depths[9] = 0.0;
        assert!((segment.coverage(0, 2) - 30.0).abs() < f64::EPSILON);
        // Too few bins to trim: the raw median is used.
        let short = uniform_segment(0, 1000, 12.0, 3);
        assert!((short.coverage(0, 2) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert!((median(&[3.0, 1.0, 2.0]) - 2.0).abs() < f64::EPSILON);
        assert!((median(&[4.0, 1.0, 2.0, 3.0]) - 2.5).abs() < f64::EPSILON);
        assert!(median(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn filter_labels_accumulate_without_duplicates() {
        let mut call = SegmentCall::default();
        call.push_filter("q7");
        call.push_filter("L2000");
        call.push_filter("q7");
        assert_eq!(call.filter.as_deref(), Some("q7;L2000"));
    }

    #[test]
    fn empty_sets_are_forbidden() {
        assert!(SegmentSet::new(None, None).is_err());
        assert!(SegmentSet::new(Some(Vec::new()), None).is_err());
    }

    #[test]
    fn mismatched_haplotype_extents_are_rejected() {
        let a = uniform_segment(0, 10_000, 30.0, 10);
        let b = uniform_segment(0, 8_000, 30.0, 8);
        assert!(SegmentSet::new(Some(vec![a]), Some(vec![b])).is_err());
    }

    #[test]
    fn common_region_overlap_yields_two_haplotypes() -> Result<(), CallerError> {
        let segment = uniform_segment(0, 10_000, 30.0, 10);
        let regions = RegionSet::from_ranges([range(4000, 6000)]);
        let sets = build_segment_sets(vec![segment], &regions)?;
        assert_eq!(sets.len(), 1);

        let alternative = sets[0].haplotype(Haplotype::B).expect("split haplotype expected");
        assert_eq!(
            alternative.iter().map(|s| (s.range.begin, s.range.end)).collect::<Vec<_>>(),
            vec![(0, 4000), (4000, 6000), (6000, 10_000)],
        );
        // Bins are apportioned by length and none are lost.
        let total_bins: usize = alternative.iter().map(|s| s.samples[0].bin_depths.len()).sum();
        assert_eq!(total_bins, 10);
        assert_eq!(sets[0].span(), range(0, 10_000));
        Ok(())
    }

    #[test]
    fn segments_without_common_regions_stay_single() -> Result<(), CallerError> {
        let segment = uniform_segment(0, 10_000, 30.0, 10);
        let sets = build_segment_sets(vec![segment], &RegionSet::default())?;
        assert_eq!(sets.len(), 1);
        assert!(sets[0].haplotype(Haplotype::B).is_none());
        assert!(sets[0].haplotype(Haplotype::A).is_some());
        Ok(())
    }
}
