pub mod read;
pub mod write;

pub use read::{
    read_ploidy_bed, read_region_bed, read_segment_table, BedReaderError, SegmentReaderError,
    SegmentRecord,
};
pub use write::{TableWriter, WriterError};
