use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to serialize command line arguments")]
    SerializeArgs(#[source] serde_yaml::Error),

    #[error("Unable to serialize arguments into {file}")]
    WriteArgs{file: String, #[source] source: std::io::Error},

    #[error("Got {names} sample name(s) for {tables} segmentation table(s)")]
    SampleNameCount{names: usize, tables: usize},
}
