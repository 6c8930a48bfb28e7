//! Where sampled rows end up

use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};

use super::reading::Timestamp;
use crate::{Error, Result};

/// An ordered record of rows under a single header
pub trait Sink {
    /// Write the column names; only valid once, before any row
    fn write_header(&mut self, columns: &[&str]) -> Result<()>;

    /// Append one row, as wide as the header
    ///
    /// Each row is handed to the output in one piece. If a failure cuts one short, the fragment
    /// is closed off on its own line before the next row, so later rows stay intact.
    fn append_row(&mut self, values: &[String]) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// [Sink] writing comma separated values to any [Write]
pub struct CsvSink<W: Write> {
    out: W,
    width: Option<usize>,
    path: Option<PathBuf>,
    /// A failed write left part of a line behind
    torn: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: None,
            path: None,
            torn: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Encode a record into a complete CSV line, quoting as needed
    fn encode<T: AsRef<[u8]>>(record: &[T]) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(record)?;
        writer
            .into_inner()
            .map_err(|e| Error::SinkWrite(e.error().to_string()))
    }

    /// Write one encoded line, ending any line a previous failure cut short first
    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        if self.torn {
            self.out
                .write_all(b"\n")
                .map_err(|e| Error::SinkWrite(format!("could not end torn row: {}", e)))?;
            self.torn = false;
        }

        let mut written = 0;
        while written < line.len() {
            match self.out.write(&line[written..]) {
                Ok(0) => {
                    self.torn = written > 0;
                    return Err(Error::SinkWrite("writer accepted no more bytes".to_owned()));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.torn = written > 0;
                    if self.torn {
                        warn!("Row cut short after {} of {} bytes", written, line.len());
                    }
                    return Err(Error::SinkWrite(e.to_string()));
                }
            }
        }

        self.out
            .flush()
            .map_err(|e| Error::SinkWrite(e.to_string()))
    }
}

impl CsvSink<File> {
    /// Create a new file named after `started` inside `dir`
    ///
    /// The directory is created if missing. An existing file is never overwritten.
    pub fn create(dir: impl AsRef<Path>, started: &Timestamp) -> Result<Self> {
        let dir = dir.as_ref();
        let path = dir.join(format!("data_{}.csv", started.file_stem()));

        fs::create_dir_all(dir).map_err(|source| Error::SinkOpen {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| Error::SinkOpen {
                path: path.clone(),
                source,
            })?;
        debug!("Opened {}", path.display());

        Ok(Self {
            out: file,
            width: None,
            path: Some(path),
            torn: false,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl<W: Write> Sink for CsvSink<W> {
    fn write_header(&mut self, columns: &[&str]) -> Result<()> {
        if self.width.is_some() {
            return Err(Error::SinkWrite("header already written".to_owned()));
        }
        if columns.is_empty() {
            return Err(Error::SinkWrite("header has no columns".to_owned()));
        }

        let line = Self::encode(columns)?;
        self.write_line(&line)?;
        self.width = Some(columns.len());
        Ok(())
    }

    fn append_row(&mut self, values: &[String]) -> Result<()> {
        match self.width {
            None => Err(Error::SinkWrite("row written before the header".to_owned())),
            Some(width) if width != values.len() => Err(Error::SinkWrite(format!(
                "row has {} fields, header has {}",
                values.len(),
                width
            ))),
            Some(_) => {
                let line = Self::encode(values)?;
                self.write_line(&line)
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| Error::SinkWrite(e.to_string()))
    }
}
