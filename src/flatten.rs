//! Flattening structure records into CSV rows.
//!
//! Each [`Item`] expands into one [`OutputRow`] per entry of its `entry_subset`,
//! in upstream order. [`RowWriter`] appends those rows to any `Write` sink one
//! item at a time, after a header written once up front.

use crate::error::{Error, Result};
use crate::types::{Item, OutputRow, StructureRecord};
use csv::{Writer, WriterBuilder};
use serde::Deserialize;
use std::io::Write;

/// Column names of the output, in order
pub const HEADER: [&str; 2] = ["pfam_acc", "structure"];

/// Expand one item into its output rows
///
/// # Errors
/// Returns [`Error::MalformedItem`] if the item lacks `metadata.accession`,
/// `entry_subset`, or an `accession`/`chain` on any sub-entry.
pub fn flatten_item(item: &Item) -> Result<Vec<OutputRow>> {
    let record = StructureRecord::deserialize(&item.0).map_err(|e| Error::MalformedItem {
        accession: item.accession().map(str::to_string),
        reason: e.to_string(),
    })?;

    Ok(record
        .entry_subset
        .iter()
        .map(|entry| OutputRow::new(&record.metadata.accession, entry))
        .collect())
}

/// Streaming CSV writer for flattened rows
pub struct RowWriter<W: Write> {
    writer: Writer<W>,
    rows: u64,
}

impl<W: Write> RowWriter<W> {
    /// Wrap `sink` and write the header line
    pub fn new(sink: W) -> Result<Self> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(sink);
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(Self { writer, rows: 0 })
    }

    /// Flatten `item`, append its rows and flush them to the sink
    ///
    /// Returns the number of rows written for this item. Nothing is written
    /// for a malformed item.
    pub fn write_item(&mut self, item: &Item) -> Result<usize> {
        let rows = flatten_item(item)?;
        for row in &rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;

        self.rows += rows.len() as u64;
        Ok(rows.len())
    }

    /// Rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flush and hand back the sink
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}
