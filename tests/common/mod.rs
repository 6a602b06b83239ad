use genome::{GenomicRange, PloidyMap};
use joint_calling::{
    model::GaussianCoverageModel,
    params::CallerParams,
    pedigree::{Kinship, Pedigree, Sample},
    segments::{Segment, SegmentSample, SegmentSet},
};

pub const MEAN_COVERAGE: f64 = 30.0;

/// Mock one sequenced individual backed by the default depth model.
pub fn mock_sample(name: &str, kin: Kinship) -> Sample {
    mock_sample_with_ploidy(name, kin, PloidyMap::default())
}

pub fn mock_sample_with_ploidy(name: &str, kin: Kinship, ploidy: PloidyMap) -> Sample {
    let params = CallerParams::default();
    let model = Box::new(GaussianCoverageModel::new(MEAN_COVERAGE, params.max_copy_number));
    Sample::new(name, kin, MEAN_COVERAGE, ploidy, model)
}

/// Mock a father/mother/child trio. Working order: child, father, mother.
pub fn mock_trio() -> Pedigree {
    Pedigree::new(vec![
        mock_sample("father", Kinship::Parent),
        mock_sample("mother", Kinship::Parent),
        mock_sample("child",  Kinship::Proband),
    ]).expect("a trio is a valid pedigree")
}

/// Mock a multi-sample segment with uniform per-sample coverage and no SNV
/// observations. One coverage entry per sample, in working order.
pub fn mock_segment(chrom: &str, begin: u32, end: u32, coverages: &[f64]) -> Segment {
    let samples = coverages.iter()
        .map(|&depth| SegmentSample::new(vec![depth; 8], Vec::new()))
        .collect();
    Segment::new(
        GenomicRange::new(chrom, begin, end).expect("valid mock range"),
        samples,
    )
}

/// Wrap segments into single-haplotype sets.
pub fn mock_sets(segments: Vec<Segment>) -> Vec<SegmentSet> {
    segments.into_iter().map(SegmentSet::single).collect()
}
