use ahash::AHashMap;
use itertools::Itertools;
use rust_lapper::{Interval, Lapper};

use crate::GenomicRange;

/// A queryable set of genomic regions (e.g. population-common CNVs), backed by
/// one interval tree per chromosome.
#[derive(Debug, Default)]
pub struct RegionSet {
    trees: AHashMap<String, Lapper<u32, u32>>,
    len  : usize,
}

impl RegionSet {
    #[must_use]
    pub fn from_ranges(ranges: impl IntoIterator<Item = GenomicRange>) -> Self {
        let mut intervals: AHashMap<String, Vec<Interval<u32, u32>>> = AHashMap::new();
        let mut len = 0;
        for range in ranges {
            intervals.entry(range.chrom.clone())
                .or_default()
                .push(Interval{start: range.begin, stop: range.end, val: 0});
            len += 1;
        }
        let trees = intervals.into_iter().map(|(chrom, ivs)| (chrom, Lapper::new(ivs))).collect();
        Self{trees, len}
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sorted list of every chromosome name carrying at least one region.
    #[must_use]
    pub fn chromosomes(&self) -> Vec<&str> {
        self.trees.keys().map(String::as_str).sorted().collect()
    }

    /// All regions intersecting `range`, in positional order.
    #[must_use]
    pub fn overlapping(&self, range: &GenomicRange) -> Vec<GenomicRange> {
        let Some(tree) = self.trees.get(&range.chrom) else { return Vec::new() };
        tree.find(range.begin, range.end)
            .map(|hit| GenomicRange{chrom: range.chrom.clone(), begin: hit.start, end: hit.stop})
            .sorted()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(chrom: &str, begin: u32, end: u32) -> GenomicRange {
        GenomicRange::new(chrom, begin, end).expect("valid test range")
    }

    #[test]
    fn overlapping_regions_come_back_sorted() {
        let set = RegionSet::from_ranges([
            range("chr1", 5000, 6000),
            range("chr1", 1000, 2000),
            range("chr2", 1000, 2000),
        ]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.chromosomes(), vec!["chr1", "chr2"]);
        assert_eq!(
            set.overlapping(&range("chr1", 0, 10_000)),
            vec![range("chr1", 1000, 2000), range("chr1", 5000, 6000)],
        );
        assert!(set.overlapping(&range("chr3", 0, 10_000)).is_empty());
    }
}
