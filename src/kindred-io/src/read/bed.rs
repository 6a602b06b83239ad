use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use genome::GenomicRange;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BedReaderError {
    #[error("Failed to open BED file {path}")]
    OpenBed{path: String, #[source] source: std::io::Error},

    #[error("[{path}:{line}] Failed to read line")]
    ReadLine{path: String, line: usize, #[source] source: std::io::Error},

    #[error("[{path}:{line}] Expected at least {expected} tab-separated fields, got {found}")]
    InvalidFields{path: String, line: usize, expected: usize, found: usize},

    #[error("[{path}:{line}] Invalid interval: {reason}")]
    InvalidInterval{path: String, line: usize, reason: String},

    #[error("[{path}:{line}] Invalid ploidy {value:?}")]
    InvalidPloidy{path: String, line: usize, value: String},
}

/// Read a ploidy BED: `chrom  start  end  expected-ploidy` per line.
pub fn read_ploidy_bed(path: impl AsRef<Path>) -> Result<Vec<(GenomicRange, u32)>, BedReaderError> {
    parse_bed(path, 4, |fields, ctx| {
        let ploidy: u32 = fields[3].parse().map_err(|_| BedReaderError::InvalidPloidy{
            path: ctx.0.to_string(), line: ctx.1, value: fields[3].to_string(),
        })?;
        Ok(ploidy)
    })
}

/// Read a plain region BED, keeping the first three columns.
pub fn read_region_bed(path: impl AsRef<Path>) -> Result<Vec<GenomicRange>, BedReaderError> {
    let regions = parse_bed(path, 3, |_, _| Ok(()))?;
    Ok(regions.into_iter().map(|(range, ())| range).collect())
}

fn parse_bed<T>(
    path: impl AsRef<Path>,
    min_fields: usize,
    mut parse_value: impl FnMut(&[&str], (&str, usize)) -> Result<T, BedReaderError>,
) -> Result<Vec<(GenomicRange, T)>, BedReaderError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let reader = BufReader::new(File::open(path)
        .map_err(|source| BedReaderError::OpenBed{path: display.clone(), source})?);

    let mut entries = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = line.map_err(|source| BedReaderError::ReadLine{
            path: display.clone(), line: line_no, source,
        })?;
        if line.is_empty() || line.starts_with('#') || line.starts_with("track") {
            continue
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < min_fields {
            return Err(BedReaderError::InvalidFields{
                path: display, line: line_no, expected: min_fields, found: fields.len(),
            })
        }

        let begin: u32 = fields[1].parse().map_err(|_| BedReaderError::InvalidInterval{
            path: display.clone(), line: line_no, reason: format!("bad start {:?}", fields[1]),
        })?;
        let end: u32 = fields[2].parse().map_err(|_| BedReaderError::InvalidInterval{
            path: display.clone(), line: line_no, reason: format!("bad end {:?}", fields[2]),
        })?;
        let range = GenomicRange::new(fields[0], begin, end)
            .map_err(|err| BedReaderError::InvalidInterval{
                path: display.clone(), line: line_no, reason: err.to_string(),
            })?;

        let value = parse_value(&fields, (&display, line_no))?;
        entries.push((range, value));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_bed(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write bed");
        file
    }

    #[test]
    fn ploidy_overrides_parse() -> Result<(), BedReaderError> {
        let bed = write_bed("chrX\t2700000\t155000000\t1\nchrY\t0\t57000000\t1\n");
        let overrides = read_ploidy_bed(bed.path())?;
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0].1, 1);
        assert_eq!(overrides[0].0, GenomicRange::new("chrX", 2_700_000, 155_000_000).expect("range"));
        Ok(())
    }

    #[test]
    fn region_beds_keep_three_columns() -> Result<(), BedReaderError> {
        let bed = write_bed("# common CNVs\nchr1\t1000\t2000\tsome-name\t0.4\n");
        let regions = read_region_bed(bed.path())?;
        assert_eq!(regions, vec![GenomicRange::new("chr1", 1000, 2000).expect("range")]);
        Ok(())
    }

    #[test]
    fn malformed_ploidy_is_rejected() {
        let bed = write_bed("chrX\t0\t100\tdiploid\n");
        assert!(matches!(read_ploidy_bed(bed.path()), Err(BedReaderError::InvalidPloidy{..})));
    }

    #[test]
    fn inverted_intervals_are_rejected() {
        let bed = write_bed("chr1\t2000\t1000\n");
        assert!(matches!(read_region_bed(bed.path()), Err(BedReaderError::InvalidInterval{..})));
    }
}
