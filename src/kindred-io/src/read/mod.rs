mod segments;
pub use segments::{read_segment_table, SegmentReaderError, SegmentRecord};

mod bed;
pub use bed::{read_ploidy_bed, read_region_bed, BedReaderError};
