//! Append-safe CSV dataset.
//!
//! A new or empty file gets the header row first. An existing non-empty file
//! is appended to, provided its header matches the current layout. Each row is
//! flushed as soon as it is written, so an interrupted sweep leaves only whole
//! rows behind.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::{Writer, WriterBuilder};
use log::info;

use super::row::{dataset_columns, flatten_row};
use super::RowSink;
use crate::aggregate::ResultRow;
use crate::error_handling::SinkError;

/// CSV file sink.
pub struct CsvSink {
    path: PathBuf,
    writer: Writer<File>,
    rows_written: usize,
}

impl CsvSink {
    /// Opens `path` for appending, writing the header if the file is new or empty.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        let columns = dataset_columns();
        let existing_len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let appending = existing_len > 0;

        if appending {
            let mut first_line = String::new();
            BufReader::new(File::open(path)?).read_line(&mut first_line)?;
            let mut header = csv::ReaderBuilder::new()
                .has_headers(false)
                .from_reader(first_line.as_bytes());
            let existing: Vec<String> = match header.records().next() {
                Some(record) => record?.iter().map(str::to_string).collect(),
                None => Vec::new(),
            };
            if existing != columns {
                return Err(SinkError::HeaderMismatch {
                    path: path.to_path_buf(),
                });
            }
            info!("Appending to existing dataset {}", path.display());
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if !appending {
            writer.write_record(&columns)?;
            writer.flush()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[async_trait]
impl RowSink for CsvSink {
    async fn write_row(&mut self, row: &ResultRow) -> Result<(), SinkError> {
        self.writer.write_record(flatten_row(row))?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
