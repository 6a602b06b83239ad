use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Output file {0} already exists. Use --overwrite to replace it")]
    Exists(String),

    #[error("Failed to create output file {path}")]
    Create{path: String, #[source] source: std::io::Error},

    #[error("Failed to write output")]
    Write(#[source] std::io::Error),
}

/// A buffered tab-separated table writer over a file or standard output.
pub struct TableWriter<'a> {
    sink: BufWriter<Box<dyn Write + 'a>>,
}

impl<'a> TableWriter<'a> {
    /// Open `path` for writing, refusing to clobber an existing file unless
    /// `overwrite` is set.
    pub fn create(path: impl AsRef<Path>, overwrite: bool) -> Result<Self, WriterError> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(WriterError::Exists(path.display().to_string()))
        }
        let file = File::create(path).map_err(|source| WriterError::Create{
            path: path.display().to_string(), source,
        })?;
        Ok(Self{sink: BufWriter::new(Box::new(file))})
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self{sink: BufWriter::new(Box::new(std::io::stdout()))}
    }

    /// Write one line per item, then flush.
    pub fn write_iter<T, I>(&mut self, rows: T) -> Result<(), WriterError>
    where
        T: IntoIterator<Item = I>,
        I: std::fmt::Display,
    {
        for row in rows {
            writeln!(self.sink, "{row}").map_err(WriterError::Write)?;
        }
        self.sink.flush().map_err(WriterError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_land_line_by_line() -> Result<(), WriterError> {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("calls.tsv");
        let mut writer = TableWriter::create(&path, false)?;
        writer.write_iter(["a\t1", "b\t2"])?;
        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, "a\t1\nb\t2\n");
        Ok(())
    }

    #[test]
    fn existing_files_need_overwrite() -> Result<(), WriterError> {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("calls.tsv");
        TableWriter::create(&path, false)?.write_iter(["first"])?;
        assert!(matches!(TableWriter::create(&path, false), Err(WriterError::Exists(_))));
        TableWriter::create(&path, true)?.write_iter(["second"])?;
        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, "second\n");
        Ok(())
    }
}
