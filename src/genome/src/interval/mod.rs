use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

mod error;
pub use error::GenomicRangeError;

/// A half-open genomic interval, as in `chr5:100000-250000`.
///
/// Ranges are compared and ordered using chromosome and start position,
/// chromosome (lexicographic) taking priority.
///
/// # Example
/// ```rust
/// use genome::GenomicRange;
///
/// let dup: GenomicRange = "chr2:1000-5000".parse().unwrap();
/// assert_eq!(dup.len(), 4000);
/// assert!(dup < "chr2:2000-3000".parse().unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomicRange {
    pub chrom: String,
    pub begin: u32,
    pub end  : u32,
}

impl GenomicRange {
    /// Build a half-open range. `begin` must be strictly smaller than `end`.
    pub fn new(chrom: impl Into<String>, begin: u32, end: u32) -> Result<Self, GenomicRangeError> {
        if begin >= end {
            return Err(GenomicRangeError::EmptyRange{begin, end})
        }
        Ok(Self{chrom: chrom.into(), begin, end})
    }

    #[must_use]
    pub fn len(&self) -> u32 {
        self.end - self.begin
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Number of overlapping base pairs with `other`. Zero when the two ranges
    /// lie on different chromosomes, or do not intersect.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> u32 {
        if self.chrom != other.chrom {
            return 0
        }
        let begin = self.begin.max(other.begin);
        let end   = self.end.min(other.end);
        end.saturating_sub(begin)
    }

    /// Distance in base pairs separating `self` from a downstream range on the
    /// same chromosome. `None` when chromosomes differ, or when the two ranges
    /// touch or intersect.
    #[must_use]
    pub fn gap_to(&self, downstream: &Self) -> Option<u32> {
        if self.chrom != downstream.chrom || downstream.begin < self.end {
            return None
        }
        Some(downstream.begin - self.end)
    }

    /// Split `self` at every provided breakpoint falling strictly within the
    /// range. Breakpoints outside `(begin, end)` are ignored. The output
    /// pieces are contiguous, ordered, and cover `self` exactly.
    #[must_use]
    pub fn split_at(&self, breakpoints: &[u32]) -> Vec<Self> {
        let mut cuts: Vec<u32> = breakpoints.iter()
            .copied()
            .filter(|pos| *pos > self.begin && *pos < self.end)
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut begin = self.begin;
        for cut in cuts {
            pieces.push(Self{chrom: self.chrom.clone(), begin, end: cut});
            begin = cut;
        }
        pieces.push(Self{chrom: self.chrom.clone(), begin, end: self.end});
        pieces
    }
}

impl Display for GenomicRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.begin, self.end)
    }
}

impl FromStr for GenomicRange {
    type Err = GenomicRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let make_err = || GenomicRangeError::ParseRange(s.to_string());
        let (chrom, span) = s.rsplit_once(':').ok_or_else(make_err)?;
        let (begin, end)  = span.split_once('-').ok_or_else(make_err)?;
        let begin = begin.parse::<u32>().map_err(|_| make_err())?;
        let end   = end.parse::<u32>().map_err(|_| make_err())?;
        Self::new(chrom, begin, end)
    }
}

impl Ord for GenomicRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.chrom.cmp(&other.chrom)
            .then(self.begin.cmp(&other.begin))
            .then(self.end.cmp(&other.end))
    }
}

impl PartialOrd for GenomicRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
