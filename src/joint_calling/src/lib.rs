use std::{fs::File, io::BufReader};

use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use log::{debug, info, warn};

use genome::{PloidyMap, RegionSet};
use kindred_io::SegmentRecord;

pub mod genotype;
pub mod model;
pub mod distribution;
pub mod params;
pub mod pedigree;
pub mod segments;
pub mod caller;

mod error;
pub use error::CallerError;

mod output;

pub use caller::{call_segment_sets, CallContext};
pub use distribution::CopyNumberDistribution;
pub use params::CallerParams;
pub use segments::merge_segment_sets;

use crate::{
    model::GaussianCoverageModel,
    pedigree::{parser::parse_pedigree_roles, Kinship, Pedigree, PedigreeError, Sample},
    segments::{build_segment_sets, AlleleCount, Segment, SegmentSample},
};

/// Run the `call` module: load the inputs, sweep every segment set, merge,
/// and write the call tables.
pub fn run(common: &parser::Common, args: &parser::Call) -> Result<()> {
    info!("Running the 'call' module...");
    let params = CallerParams::from_cli(args);
    params.validate()?;

    // ----------------------------- Read the per-sample segmentation tables.
    let names = args.resolved_sample_names()?;
    if names.is_empty() {
        return Err(CallerError::InvalidParameter{
            name: "segments",
            reason: String::from("at least one segmentation table is required"),
        }.into())
    }
    info!("Parsing {} segmentation table(s)...", args.segments.len());
    let mut tables: Vec<Vec<SegmentRecord>> = Vec::with_capacity(args.segments.len());
    for (path, name) in args.segments.iter().zip(&names) {
        let records = kindred_io::read_segment_table(path)
            .with_context(|| format!("While parsing the segmentation of sample {name}"))?;
        tables.push(records);
    }
    check_tables_agree(&names, &tables)?;

    // ----------------------------- Derive per-sample coverage statistics.
    let means: Vec<f64> = tables.iter()
        .map(|records| {
            let depths: Vec<f64> = records.iter()
                .flat_map(|record| record.bin_depths.iter().copied())
                .collect();
            segments::median(&depths)
        })
        .collect();
    for (name, mean) in names.iter().zip(&means) {
        debug!("Sample {name}: mean coverage {mean:.2}");
        if *mean < params.median_coverage_threshold {
            warn!("Sample {name} is shallow ({mean:.2}x). Expect low-confidence calls.");
        }
    }

    // ----------------------------- Ploidy overrides and common-CNV regions.
    let ploidy = match &args.ploidy_bed {
        Some(path) => PloidyMap::from_overrides(
            kindred_io::read_ploidy_bed(path)
                .with_context(|| format!("While parsing {}", path.display()))?,
        ),
        None => PloidyMap::default(),
    };
    let regions = match &args.common_cnvs {
        Some(path) => RegionSet::from_ranges(
            kindred_io::read_region_bed(path)
                .with_context(|| format!("While parsing {}", path.display()))?,
        ),
        None => RegionSet::default(),
    };
    let segment_chromosomes: AHashSet<&str> = tables[0].iter()
        .map(|record| record.range.chrom.as_str())
        .collect();
    for chrom in regions.chromosomes() {
        if !segment_chromosomes.contains(chrom) {
            return Err(CallerError::ChromosomeMismatch{
                source_name: args.common_cnvs.as_ref()
                    .map_or_else(|| String::from("<common CNVs>"), |path| path.display().to_string()),
                chrom: chrom.to_string(),
            }.into())
        }
    }

    // ----------------------------- Fix the working order of the samples.
    let order = working_order(args, &names)?;
    let ordered_names: Vec<String> = order.iter().map(|&(table, _)| names[table].clone()).collect();

    // ----------------------------- Assemble multi-sample segments and sets.
    let mut segments = Vec::with_capacity(tables[0].len());
    for row in 0..tables[0].len() {
        let range = tables[0][row].range.clone();
        let samples = order.iter()
            .map(|&(table, _)| {
                let record = &tables[table][row];
                let alleles = record.alleles.iter()
                    .map(|&(a, b)| AlleleCount::new(a, b))
                    .collect();
                SegmentSample::new(record.bin_depths.clone(), alleles)
            })
            .collect();
        segments.push(Segment::new(range, samples));
    }
    let mut sets = build_segment_sets(segments, &regions)?;
    let alternatives = sets.iter()
        .filter(|set| set.haplotype(segments::Haplotype::B).is_some())
        .count();
    info!("{} segment set(s), {alternatives} with alternative segmentations", sets.len());

    // ----------------------------- Build the calling context.
    let samples: Vec<Sample> = order.iter()
        .map(|&(table, kin)| Sample::new(
            names[table].clone(),
            kin,
            means[table],
            ploidy.clone(),
            Box::new(GaussianCoverageModel::new(means[table], params.max_copy_number)),
        ))
        .collect();
    let context = if args.pedigree.is_some() {
        info!("Calling with the joint family model ({} sample(s))", samples.len());
        CallContext::joint(Pedigree::new(samples).map_err(CallerError::Pedigree)?, params.clone())
    } else {
        info!("Calling {} unrelated sample(s)", samples.len());
        CallContext::cohort(samples, params.clone())
    };

    // ----------------------------- Sweep, merge, write.
    let bar = logger::Logger::try_progress_bar(sets.len() as u64, "Calling segment sets");
    call_segment_sets(&mut sets, &context, bar.as_ref())?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let merged = merge_segment_sets(&sets, &params)?;
    info!("Merged into {} call segment(s)", merged.len());
    output::write_calls(&common.output_dir, common.overwrite, &ordered_names, &merged)?;

    for (slot, name) in ordered_names.iter().enumerate() {
        let variant = merged.iter()
            .filter(|segment| segment.samples[slot].call.copy_number != 2)
            .count();
        let de_novo = merged.iter()
            .filter(|segment| segment.samples[slot].call.de_novo_quality.is_some())
            .count();
        info!("Sample {name}: {variant} non-diploid call(s), {de_novo} de-novo candidate(s)");
    }
    Ok(())
}

/// Every sample must present the same segmentation: same row count, same
/// intervals, row by row.
fn check_tables_agree(names: &[String], tables: &[Vec<SegmentRecord>]) -> Result<(), CallerError> {
    let reference = &tables[0];
    for (name, table) in names.iter().zip(tables).skip(1) {
        if table.len() != reference.len() {
            return Err(CallerError::SampleCountMismatch{
                context: "comparing segmentation tables",
                expected: reference.len(),
                found: table.len(),
            })
        }
        for (record, expected) in table.iter().zip(reference) {
            if record.range != expected.range {
                return Err(CallerError::SegmentTableMismatch{
                    sample: name.clone(),
                    range: record.range.to_string(),
                    expected: expected.range.to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Resolve each sample's role and the working order of the run: probands
/// first and parents last under a pedigree, the command line order otherwise.
/// Returns `(segmentation-table index, kinship)` pairs.
fn working_order(args: &parser::Call, names: &[String]) -> Result<Vec<(usize, Kinship)>> {
    let mut index: AHashMap<&str, usize> = AHashMap::with_capacity(names.len());
    for (table, name) in names.iter().enumerate() {
        if index.insert(name.as_str(), table).is_some() {
            return Err(CallerError::InvalidParameter{
                name: "sample-names",
                reason: format!("sample {name} appears twice"),
            }.into())
        }
    }

    let Some(path) = &args.pedigree else {
        return Ok((0..names.len()).map(|table| (table, Kinship::Other)).collect())
    };

    info!("Parsing pedigree {}...", path.display());
    let reader = BufReader::new(File::open(path)
        .with_context(|| format!("While opening {}", path.display()))?);
    let roles = parse_pedigree_roles(reader).map_err(CallerError::Pedigree)?;

    let mut probands = Vec::new();
    let mut parents = Vec::new();
    let mut in_pedigree: AHashSet<&str> = AHashSet::with_capacity(roles.len());
    for (id, kin) in &roles {
        let table = *index.get(id.as_str())
            .ok_or_else(|| CallerError::Pedigree(PedigreeError::MissingSample(id.clone())))?;
        match kin {
            Kinship::Proband => probands.push((table, *kin)),
            Kinship::Parent  => parents.push((table, *kin)),
            Kinship::Other   => (),
        }
        in_pedigree.insert(id.as_str());
    }
    for name in names {
        if !in_pedigree.contains(name.as_str()) {
            warn!("Sample {name} is absent from the pedigree and will be ignored");
        }
    }
    probands.extend(parents);
    Ok(probands)
}
