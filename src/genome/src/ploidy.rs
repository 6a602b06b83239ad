use ahash::AHashMap;
use rust_lapper::{Interval, Lapper};

use crate::{GenomicRange, DIPLOID};

/// Per-chromosome interval tree of expected-ploidy overrides (typically sex
/// chromosomes and pseudo-autosomal regions). Any position not covered by an
/// override is expected diploid.
#[derive(Debug, Default, Clone)]
pub struct PloidyMap(AHashMap<String, Lapper<u32, u32>>);

impl PloidyMap {
    /// Build a map from `(range, ploidy)` overrides.
    #[must_use]
    pub fn from_overrides(overrides: impl IntoIterator<Item = (GenomicRange, u32)>) -> Self {
        let mut intervals: AHashMap<String, Vec<Interval<u32, u32>>> = AHashMap::new();
        for (range, ploidy) in overrides {
            intervals.entry(range.chrom.clone())
                .or_default()
                .push(Interval{start: range.begin, stop: range.end, val: ploidy});
        }
        Self(intervals.into_iter().map(|(chrom, ivs)| (chrom, Lapper::new(ivs))).collect())
    }

    /// Expected copy number over `range`. When several overrides intersect the
    /// range, the one with the largest overlap wins.
    #[must_use]
    pub fn expected_ploidy(&self, range: &GenomicRange) -> u32 {
        let Some(tree) = self.0.get(&range.chrom) else { return DIPLOID };

        let mut best: Option<(u32, u32)> = None; // (overlap, ploidy)
        for hit in tree.find(range.begin, range.end) {
            let overlap = hit.stop.min(range.end) - hit.start.max(range.begin);
            if best.map_or(true, |(best_overlap, _)| overlap > best_overlap) {
                best = Some((overlap, hit.val));
            }
        }
        best.map_or(DIPLOID, |(_, ploidy)| ploidy)
    }
}
