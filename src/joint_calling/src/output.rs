use std::{
    fmt::{self, Display, Formatter},
    path::Path,
};

use anyhow::{Context, Result};
use kindred_io::TableWriter;
use log::info;

use crate::segments::Segment;

const HEADER: &str = "#sample\tchrom\tbegin\tend\tcopy_number\tmajor_chromosome_count\tquality\tde_novo_quality\tfilter";

/// One sample's call over one merged segment, rendered as a table row.
struct CallRow<'a> {
    sample: &'a str,
    segment: &'a Segment,
    slot: usize,
}

impl Display for CallRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let call = &self.segment.samples[self.slot].call;
        let mcc = call.major_chromosome_count
            .map_or_else(|| String::from("."), |count| count.to_string());
        let dqs = call.de_novo_quality
            .map_or_else(|| String::from("."), |quality| format!("{quality:.2}"));
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{}\t{}",
            self.sample,
            self.segment.range.chrom,
            self.segment.range.begin,
            self.segment.range.end,
            call.copy_number,
            mcc,
            call.quality_score,
            dqs,
            call.filter.as_deref().unwrap_or("PASS"),
        )
    }
}

/// Write the merged calls: one multi-sample table, plus one table per sample.
pub(crate) fn write_calls(
    output_dir: &Path,
    overwrite: bool,
    sample_names: &[String],
    merged: &[Segment],
) -> Result<()> {
    let multi_path = output_dir.join("calls.tsv");
    let mut multi = TableWriter::create(&multi_path, overwrite)
        .with_context(|| format!("While opening {}", multi_path.display()))?;
    multi.write_iter(std::iter::once(HEADER))?;
    multi.write_iter(merged.iter().flat_map(|segment| {
        sample_names.iter().enumerate().map(move |(slot, sample)| {
            CallRow{sample, segment, slot}
        })
    }))?;
    info!("Wrote {}", multi_path.display());

    for (slot, sample) in sample_names.iter().enumerate() {
        let path = output_dir.join(format!("{sample}.calls.tsv"));
        let mut writer = TableWriter::create(&path, overwrite)
            .with_context(|| format!("While opening {}", path.display()))?;
        writer.write_iter(std::iter::once(HEADER))?;
        writer.write_iter(merged.iter().map(|segment| CallRow{sample, segment, slot}))?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::SegmentSample;
    use genome::GenomicRange;

    #[test]
    fn rows_render_optional_fields_as_dots() {
        let mut slot = SegmentSample::new(vec![30.0], Vec::new());
        slot.call.copy_number = 1;
        slot.call.quality_score = 35.5;
        let segment = Segment::new(
            GenomicRange::new("chr2", 1000, 5000).expect("valid range"),
            vec![slot],
        );
        let row = CallRow{sample: "child", segment: &segment, slot: 0};
        assert_eq!(row.to_string(), "child\tchr2\t1000\t5000\t1\t.\t35.50\t.\tPASS");
    }

    #[test]
    fn calls_land_in_per_sample_and_multi_sample_tables() -> Result<()> {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut slot = SegmentSample::new(vec![30.0], Vec::new());
        slot.call.de_novo_quality = Some(26.0);
        slot.call.filter = Some(String::from("q7"));
        let segment = Segment::new(
            GenomicRange::new("chr1", 0, 10_000).expect("valid range"),
            vec![slot],
        );

        write_calls(dir.path(), false, &[String::from("child")], &[segment])?;
        let multi = std::fs::read_to_string(dir.path().join("calls.tsv"))?;
        let single = std::fs::read_to_string(dir.path().join("child.calls.tsv"))?;
        assert!(multi.contains("26.00"));
        assert!(multi.contains("q7"));
        assert_eq!(multi, single);
        Ok(())
    }
}
