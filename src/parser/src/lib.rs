use std::{
    ffi::OsStr,
    fs::File,
    path::PathBuf,
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::debug;
use serde::{Deserialize, Serialize};

mod error;
pub use error::ParserError;

/// kindred-rs: pedigree-aware copy-number variant calling
#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="kindred-rs", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// Set the verbosity level (-v -vv -vvv)
    ///
    /// -v: Info  |  -vv: Debug  |  -vvv: Trace {n}
    ///
    /// Warnings are emitted even when this flag is off; use --quiet to
    /// disable them.
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Serialize the parsed invocation into a `.yaml` file at the root of the
    /// output directory, named `{current time}-call.yaml`.
    ///
    /// # Errors
    /// When serde_yaml fails to render `Self`, or the file cannot be written.
    pub fn serialize(&self) -> Result<()> {
        let serialized = serde_yaml::to_string(&self)
            .map_err(ParserError::SerializeArgs)?;
        debug!("\n---- Command line args ----\n{serialized}\n---");

        let Commands::Call{common, ..} = &self.commands else { return Ok(()) };
        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S");
        let output_file = common.output_dir.join(format!("{current_time}-call.yaml"));
        std::fs::write(&output_file, serialized)
            .map_err(|source| ParserError::WriteArgs{file: output_file.display().to_string(), source})?;
        Ok(())
    }

    /// Deserialize a previously serialized invocation.
    ///
    /// # Errors
    /// When the file cannot be opened, or does not parse back into `Self`.
    pub fn deserialize(yaml: &PathBuf) -> Result<Self> {
        Ok(serde_yaml::from_reader(File::open(yaml)?)?)
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Call copy-number variants on pre-segmented WGS samples.
    Call {
        #[clap(flatten)]
        common: Common,
        #[clap(flatten)]
        call: Box<Call>, // Box<T> to mitigate the size difference between variants.
    },
    /// Replay a previous invocation from its serialized .yaml file.
    FromYaml {
        /// Path to a serialized invocation (see the .yaml files written into
        /// --output-dir).
        #[clap(parse(try_from_os_str=valid_input_file))]
        yaml: PathBuf,
    },
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Common {
    /// Output directory where result files and argument serializations are
    /// written. Created when missing.
    #[clap(short='o', long, default_value("."), parse(try_from_os_str=valid_output_dir))]
    pub output_dir: PathBuf,

    /// Overwrite pre-existing output files.
    #[clap(short='w', long)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Call {
    /// Per-sample segmentation tables (one file per sample).
    ///
    /// Four or five tab-separated columns per row:
    /// <chrom> <begin> <end> <bin-depths> [<allele-counts>] {n}
    /// Bin depths are comma-separated; allele counts are 'A:B' pairs
    /// separated by ';'.
    #[clap(short='s', long, multiple_values(true), required(true), parse(try_from_os_str=valid_input_file))]
    pub segments: Vec<PathBuf>,

    /// Sample names, in the order of --segments.
    ///
    /// Defaults to the segmentation table file stems.
    #[clap(short='n', long, multiple_values(true))]
    pub sample_names: Vec<String>,

    /// Path to a PED pedigree definition. With a pedigree the caller runs the
    /// joint family model; without one, samples are called independently.
    #[clap(short='T', long, parse(try_from_os_str=valid_input_file))]
    pub pedigree: Option<PathBuf>,

    /// BED of expected-ploidy overrides: <chrom> <start> <end> <ploidy>.
    #[clap(long, parse(try_from_os_str=valid_input_file))]
    pub ploidy_bed: Option<PathBuf>,

    /// BED of population-common CNV regions, used to propose alternative
    /// segmentations around known polymorphic loci.
    #[clap(long, parse(try_from_os_str=valid_input_file))]
    pub common_cnvs: Option<PathBuf>,

    /// Upper bound on the worker-thread count.
    #[clap(short='@', long, default_value("30"))]
    pub threads: usize,

    /// Provide the RNG with a set seed.
    #[clap(long, required(false), default_value_t=fastrand::u64(u64::MIN..=u64::MAX))]
    pub seed: u64,

    /// Number of modeled copy-number states.
    #[clap(long, default_value("5"))]
    pub max_copy_number: usize,

    /// Cap on the enumerated offspring genotype combinations. Larger
    /// enumerations are randomly subsampled down to this size (see --seed).
    #[clap(long, default_value("500"))]
    pub max_offspring_genotypes: usize,

    /// Largest number of distinct copy-number states within one combination
    /// when calling without a pedigree.
    #[clap(long, default_value("3"))]
    pub max_allele_number: usize,

    /// Minimum heterozygous SNV count (per sample and segment) before allele
    /// evidence contributes to major chromosome counts.
    #[clap(long, default_value("4"))]
    pub read_counts_threshold: usize,

    /// Heterozygous SNVs per kilobase under which allele evidence is
    /// reported as sparse.
    #[clap(long, default_value("0.1"))]
    pub allele_density_threshold: f64,

    /// At most this many SNV observations per segment enter the allele
    /// likelihoods.
    #[clap(long, default_value("100"))]
    pub per_segment_allele_max_counts: usize,

    /// Mean coverage under which a sample is flagged as shallow.
    #[clap(long, default_value("4"))]
    pub median_coverage_threshold: f64,

    /// Ceiling applied to every Phred-scaled quality.
    #[clap(long, default_value("60"))]
    pub max_q_score: f64,

    /// Calls under this quality receive a q-filter label.
    #[clap(long, default_value("7"))]
    pub quality_filter_threshold: f64,

    /// De-novo calls under this quality receive a dq-filter label.
    #[clap(long, default_value("20"))]
    pub de_novo_quality_filter_threshold: f64,

    /// Baseline probability of a copy-number mutation unexplained by either
    /// parent.
    #[clap(long, default_value("1e-6"))]
    pub de_novo_rate: f64,

    /// Calls shorter than this many base pairs receive a size filter label.
    #[clap(long, default_value("2000"))]
    pub minimum_call_size: u32,

    /// Adjacent same-state calls separated by at most this many base pairs
    /// are merged.
    #[clap(long, default_value("10000"))]
    pub max_merge_gap: u32,

    /// Bins dropped from each segment flank before the coverage median.
    #[clap(long, default_value("2"))]
    pub number_of_trimmed_bins: usize,
}

impl Call {
    /// Sample names as provided, or derived from the segmentation table file
    /// stems.
    ///
    /// # Errors
    /// [`ParserError::SampleNameCount`] when explicit names do not pair up
    /// with the segmentation tables.
    pub fn resolved_sample_names(&self) -> Result<Vec<String>, ParserError> {
        if self.sample_names.is_empty() {
            return Ok(self.segments.iter()
                .map(|path| {
                    path.file_stem()
                        .unwrap_or(OsStr::new("sample"))
                        .to_string_lossy()
                        .into_owned()
                })
                .collect())
        }
        if self.sample_names.len() != self.segments.len() {
            return Err(ParserError::SampleNameCount{
                names: self.sample_names.len(),
                tables: self.segments.len(),
            })
        }
        Ok(self.sample_names.clone())
    }
}

/// Ensure a user-provided path exists and points to a regular file.
fn valid_input_file(os_str: &OsStr) -> Result<PathBuf, String> {
    let path = PathBuf::from(os_str);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{path:?} is not a valid input file"))
    }
}

/// Ensure the output directory exists, creating it when missing.
fn valid_output_dir(os_str: &OsStr) -> Result<PathBuf, String> {
    let path = PathBuf::from(os_str);
    if !path.exists() {
        std::fs::create_dir_all(&path)
            .map_err(|err| format!("Cannot create output directory {path:?}: {err}"))?;
    }
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("{path:?} is not a valid output directory"))
    }
}
