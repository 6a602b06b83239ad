mod interval;
pub use interval::{GenomicRange, GenomicRangeError};

mod ploidy;
pub use ploidy::PloidyMap;

mod regions;
pub use regions::RegionSet;

/// Expected copy number of an autosomal region, absent any ploidy override.
pub const DIPLOID: u32 = 2;
