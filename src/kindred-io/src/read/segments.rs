use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use genome::GenomicRange;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmentReaderError {
    #[error("Failed to open segmentation table {path}")]
    OpenTable{path: String, #[source] source: std::io::Error},

    #[error("[{path}:{line}] Failed to read line")]
    ReadLine{path: String, line: usize, #[source] source: std::io::Error},

    #[error("[{path}:{line}] Expected at least 4 tab-separated fields, got {found}")]
    InvalidFields{path: String, line: usize, found: usize},

    #[error("[{path}:{line}] Invalid genomic interval: {reason}")]
    InvalidInterval{path: String, line: usize, reason: String},

    #[error("[{path}:{line}] Invalid bin depth {value:?}")]
    InvalidDepth{path: String, line: usize, value: String},

    #[error("[{path}:{line}] Invalid allele counts {value:?}. Expected '<A>:<B>' pairs separated by ';'")]
    InvalidAlleles{path: String, line: usize, value: String},
}

/// One row of a per-sample segmentation table.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub range: GenomicRange,
    pub bin_depths: Vec<f64>,
    /// SNV observations as (A-allele, B-allele) read counts.
    pub alleles: Vec<(u32, u32)>,
}

/// Read a per-sample segmentation table.
///
/// Four or five tab-separated columns per row:
/// `chrom  begin  end  bin-depths  [allele-counts]`, bin depths
/// comma-separated, allele counts `A:B` pairs separated by `;`. Lines
/// starting with `#` are comments. Bin depths must be finite and
/// non-negative.
pub fn read_segment_table(path: impl AsRef<Path>) -> Result<Vec<SegmentRecord>, SegmentReaderError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let reader = BufReader::new(File::open(path)
        .map_err(|source| SegmentReaderError::OpenTable{path: display.clone(), source})?);

    let mut records = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = line.map_err(|source| SegmentReaderError::ReadLine{
            path: display.clone(), line: line_no, source,
        })?;
        if line.is_empty() || line.starts_with('#') {
            continue
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(SegmentReaderError::InvalidFields{
                path: display, line: line_no, found: fields.len(),
            })
        }

        let range = parse_range(&fields[..3]).map_err(|reason| {
            SegmentReaderError::InvalidInterval{path: display.clone(), line: line_no, reason}
        })?;

        let mut bin_depths = Vec::new();
        for raw in fields[3].split(',').filter(|raw| !raw.is_empty()) {
            let depth: f64 = raw.parse().map_err(|_| SegmentReaderError::InvalidDepth{
                path: display.clone(), line: line_no, value: raw.to_string(),
            })?;
            if !depth.is_finite() || depth < 0.0 {
                return Err(SegmentReaderError::InvalidDepth{
                    path: display, line: line_no, value: raw.to_string(),
                })
            }
            bin_depths.push(depth);
        }

        let mut alleles = Vec::new();
        if let Some(raw_alleles) = fields.get(4) {
            for pair in raw_alleles.split(';').filter(|pair| !pair.is_empty()) {
                let parsed = pair.split_once(':').and_then(|(a, b)| {
                    Some((a.parse::<u32>().ok()?, b.parse::<u32>().ok()?))
                });
                match parsed {
                    Some(counts) => alleles.push(counts),
                    None => return Err(SegmentReaderError::InvalidAlleles{
                        path: display, line: line_no, value: pair.to_string(),
                    }),
                }
            }
        }

        records.push(SegmentRecord{range, bin_depths, alleles});
    }
    Ok(records)
}

fn parse_range(fields: &[&str]) -> Result<GenomicRange, String> {
    let begin: u32 = fields[1].parse().map_err(|_| format!("bad begin {:?}", fields[1]))?;
    let end: u32 = fields[2].parse().map_err(|_| format!("bad end {:?}", fields[2]))?;
    GenomicRange::new(fields[0], begin, end).map_err(|err| err.to_string())
}
