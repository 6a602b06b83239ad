use std::io::BufRead;

use ahash::AHashSet;
use log::warn;

use super::{Kinship, PedigreeError};

/// Phenotype value marking a sample as a proband.
const AFFECTED: &str = "affected";

/// Interpret a PED-formatted pedigree definition.
///
/// Six whitespace-separated columns per line: family id, sample id, maternal
/// id, paternal id, sex, phenotype. A sample whose maternal *and* paternal
/// ids are `0` is a founding parent; any other sample is a proband when its
/// phenotype reads `affected`, and is skipped with a warning otherwise.
/// Lines starting with `#` are comments.
///
/// Roles come back in file order; the caller is responsible for the
/// probands-first working order.
///
/// # Errors
/// - [`PedigreeError::InvalidFields`] when a line carries fewer than six
///   columns (1-based line number).
/// - [`PedigreeError::DuplicateSample`] when a sample id repeats.
pub fn parse_pedigree_roles<R: BufRead>(reader: R) -> Result<Vec<(String, Kinship)>, PedigreeError> {
    let mut roles = Vec::new();
    let mut seen: AHashSet<String> = AHashSet::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(PedigreeError::InvalidFields(line_idx + 1))
        }
        let (id, maternal, paternal, phenotype) = (fields[1], fields[2], fields[3], fields[5]);

        if !seen.insert(id.to_string()) {
            return Err(PedigreeError::DuplicateSample(id.to_string()))
        }

        let kin = if maternal == "0" && paternal == "0" {
            Kinship::Parent
        } else if phenotype.eq_ignore_ascii_case(AFFECTED) {
            Kinship::Proband
        } else {
            warn!("Skipping pedigree sample {id}: unaffected non-founder");
            continue
        };
        roles.push((id.to_string(), kin));
    }
    Ok(roles)
}
