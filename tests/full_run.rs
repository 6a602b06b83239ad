use std::{fs, path::PathBuf};

use clap::Parser;

const BINS_30: &str = "30,30,30,30,30,30,30,30";
const BINS_15: &str = "15,15,15,15,15,15,15,15";

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

fn segmentation(deletion_bins: &str) -> String {
    format!(
        "chr1\t0\t100000\t{BINS_30}\n\
         chr1\t100000\t110000\t{deletion_bins}\n\
         chr1\t110000\t200000\t{BINS_30}\n",
    )
}

fn parse_call(args: &[&str]) -> (parser::Common, Box<parser::Call>) {
    let cli = parser::Cli::try_parse_from(args).expect("invocation must parse");
    match cli.commands {
        parser::Commands::Call{common, call} => (common, call),
        parser::Commands::FromYaml{..} => panic!("expected the call command"),
    }
}

#[test]
fn a_trio_run_writes_call_tables_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let father = write_file(&dir, "father.tsv", &segmentation(BINS_30));
    let mother = write_file(&dir, "mother.tsv", &segmentation(BINS_30));
    let child  = write_file(&dir, "child.tsv",  &segmentation(BINS_15));
    let ped = write_file(&dir, "family.ped", "\
FAM1\tfather\t0\t0\t1\tunaffected
FAM1\tmother\t0\t0\t2\tunaffected
FAM1\tchild\tmother\tfather\t1\taffected
");

    let out = dir.path().to_str().expect("utf-8 path");
    let (common, call) = parse_call(&[
        "kindred-rs", "call",
        "--segments",
        father.to_str().expect("utf-8"),
        mother.to_str().expect("utf-8"),
        child.to_str().expect("utf-8"),
        "--pedigree", ped.to_str().expect("utf-8"),
        "--seed", "42",
        "--output-dir", out,
        "--overwrite",
    ]);
    joint_calling::run(&common, &call).expect("the run must succeed");

    let calls = fs::read_to_string(dir.path().join("calls.tsv")).expect("calls table");
    let lines: Vec<&str> = calls.lines().collect();
    // Header plus three segments times three samples.
    assert_eq!(lines.len(), 10, "{calls}");
    assert!(lines[0].starts_with("#sample"));

    // The child's deletion: CN 1 with a passing, high de-novo quality.
    let deletion = lines.iter()
        .find(|line| line.starts_with("child\tchr1\t100000"))
        .expect("the child's deletion row");
    let fields: Vec<&str> = deletion.split('\t').collect();
    assert_eq!(fields[4], "1", "copy number: {deletion}");
    let dqs: f64 = fields[7].parse().expect("a numeric de-novo quality");
    assert!(dqs > 20.0, "de-novo quality: {deletion}");
    assert_eq!(fields[8], "PASS");

    // Parents stay diploid over the same span.
    for parent in ["father", "mother"] {
        let row = lines.iter()
            .find(|line| line.starts_with(&format!("{parent}\tchr1\t100000")))
            .expect("parent row");
        assert_eq!(row.split('\t').nth(4), Some("2"), "{row}");
    }

    // Per-sample tables exist for every pedigree member.
    for sample in ["child", "father", "mother"] {
        assert!(dir.path().join(format!("{sample}.calls.tsv")).is_file());
    }
}

#[test]
fn common_cnv_regions_on_unknown_chromosomes_are_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let father = write_file(&dir, "father.tsv", &segmentation(BINS_30));
    let mother = write_file(&dir, "mother.tsv", &segmentation(BINS_30));
    let child  = write_file(&dir, "child.tsv",  &segmentation(BINS_30));
    let ped = write_file(&dir, "family.ped", "\
FAM1\tfather\t0\t0\t1\tunaffected
FAM1\tmother\t0\t0\t2\tunaffected
FAM1\tchild\tmother\tfather\t1\taffected
");
    let regions = write_file(&dir, "common.bed", "chr9\t0\t5000\n");

    let out = dir.path().to_str().expect("utf-8 path");
    let (common, call) = parse_call(&[
        "kindred-rs", "call",
        "--segments",
        father.to_str().expect("utf-8"),
        mother.to_str().expect("utf-8"),
        child.to_str().expect("utf-8"),
        "--pedigree", ped.to_str().expect("utf-8"),
        "--common-cnvs", regions.to_str().expect("utf-8"),
        "--output-dir", out,
        "--overwrite",
    ]);
    let error = joint_calling::run(&common, &call).expect_err("mismatched chromosomes must fail");
    assert!(error.to_string().contains("chr9"), "{error}");
}

#[test]
fn pedigree_entries_without_segmentation_are_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let father = write_file(&dir, "father.tsv", &segmentation(BINS_30));
    let mother = write_file(&dir, "mother.tsv", &segmentation(BINS_30));
    let ped = write_file(&dir, "family.ped", "\
FAM1\tfather\t0\t0\t1\tunaffected
FAM1\tmother\t0\t0\t2\tunaffected
FAM1\tchild\tmother\tfather\t1\taffected
");

    let out = dir.path().to_str().expect("utf-8 path");
    let (common, call) = parse_call(&[
        "kindred-rs", "call",
        "--segments",
        father.to_str().expect("utf-8"),
        mother.to_str().expect("utf-8"),
        "--pedigree", ped.to_str().expect("utf-8"),
        "--output-dir", out,
        "--overwrite",
    ]);
    let error = joint_calling::run(&common, &call).expect_err("a missing sample must fail");
    assert!(error.to_string().contains("child"), "{error}");
}
