//! Category remapping for family summary tables.
//!
//! Rewrites the `rna_type` column of a 10-column family CSV through an exact-match
//! lookup table. Rows sourced from Pfam are passed through untouched. An unknown
//! category stops the transform with [`Error::UnknownCategory`].

use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::debug;

/// Column order of the family table, input and output
pub const FIELDS: [&str; 10] = [
    "id",
    "rfam_acc",
    "description",
    "rna_type",
    "number_seqs",
    "number_of_columns",
    "number_residues",
    "average_length",
    "percent_identity",
    "source",
];

/// Built-in Rfam type annotations and their display categories
const RFAM_CATEGORIES: [(&str, &str); 23] = [
    ("Cis-reg;", "Cis-regulatory"),
    ("Cis-reg; IRES;", "IRES"),
    ("Cis-reg; frameshift_element;", "Frameshift Element"),
    ("Cis-reg; leader;", "5' Leader Element"),
    ("Cis-reg; riboswitch;", "Riboswitch"),
    ("Cis-reg; thermoregulator;", "Thermoregulator"),
    ("Gene;", "Gene"),
    ("Gene; CRISPR;", "CRISPR"),
    ("Gene; antisense;", "Antisense RNA"),
    ("Gene; antitoxin;", "Antitoxin"),
    ("Gene; lncRNA;", "lncRNA Doman"),
    ("Gene; miRNA;", "miRNA Precursor"),
    ("Gene; rRNA;", "rRNA subunit"),
    ("Gene; ribozyme;", "Ribozyme"),
    ("Gene; sRNA;", "sRNA"),
    ("Gene; snRNA;", "snRNA"),
    ("Gene; snRNA; snoRNA;", "snoRNA"),
    ("Gene; snRNA; snoRNA; CD-box;", "snoRNA"),
    ("Gene; snRNA; snoRNA; HACA-box;", "snoRNA"),
    ("Gene; snRNA; snoRNA; scaRNA;", "snoRNA"),
    ("Gene; snRNA; splicing;", "Splicing Factor"),
    ("Gene; tRNA;", "tRNA"),
    ("Intron;", "Intron"),
];

/// Immutable exact-match lookup from raw category to display category
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryMapping {
    table: HashMap<String, String>,
}

impl CategoryMapping {
    /// Build a mapping from `(raw, display)` pairs
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The built-in Rfam category table
    pub fn rfam_default() -> Self {
        Self::new(RFAM_CATEGORIES)
    }

    /// Display category for `raw`, if known
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        self.table.get(raw).map(String::as_str)
    }

    /// Number of known categories
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if the mapping knows no categories
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for CategoryMapping {
    fn default() -> Self {
        Self::rfam_default()
    }
}

/// One row of the family table
///
/// Values other than `rna_type` are carried verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRow {
    /// Family identifier
    pub id: String,
    /// Rfam accession
    pub rfam_acc: String,
    /// Free-text description
    pub description: String,
    /// Raw category, rewritten by the transform
    pub rna_type: String,
    /// Sequence count
    pub number_seqs: String,
    /// Alignment column count
    pub number_of_columns: String,
    /// Residue count
    pub number_residues: String,
    /// Average sequence length
    pub average_length: String,
    /// Average percent identity
    pub percent_identity: String,
    /// Origin of the family annotation
    pub source: String,
}

impl FamilyRow {
    /// True for rows whose categories already come from Pfam
    pub fn is_pfam(&self) -> bool {
        self.source.contains("Pfam")
    }
}

/// Rewrite `row.rna_type` through `mapping`, leaving Pfam rows alone
///
/// `line` is only used to locate the row in error messages.
pub fn remap_row(mapping: &CategoryMapping, mut row: FamilyRow, line: u64) -> Result<FamilyRow> {
    if row.is_pfam() {
        return Ok(row);
    }

    let mapped = mapping
        .lookup(&row.rna_type)
        .ok_or_else(|| Error::UnknownCategory {
            value: row.rna_type.clone(),
            line,
        })?;
    row.rna_type = mapped.to_string();
    Ok(row)
}

/// Fail unless `headers` names exactly the [`FIELDS`] columns, in any order
fn check_columns(headers: &StringRecord) -> Result<()> {
    let missing: Vec<String> = FIELDS
        .iter()
        .filter(|field| !headers.iter().any(|h| h == **field))
        .map(|field| field.to_string())
        .collect();
    let unexpected: Vec<String> = headers
        .iter()
        .filter(|h| !FIELDS.contains(h))
        .map(str::to_string)
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(Error::ColumnMismatch {
            missing,
            unexpected,
        })
    }
}

/// Stream a family CSV from `input` to `output`, remapping every row
///
/// The output always starts with the [`FIELDS`] header. Returns the number of
/// rows written. Rows before an unknown category have already been written when
/// the error is returned. An input header with missing or extra columns is
/// rejected before anything is written.
pub fn remap_csv<R: Read, W: Write>(
    mapping: &CategoryMapping,
    input: R,
    output: W,
) -> Result<u64> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);
    let headers = reader.headers()?.clone();
    check_columns(&headers)?;

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(output);
    writer.write_record(FIELDS)?;

    let mut rows: u64 = 0;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: FamilyRow = record.deserialize(Some(&headers))?;

        let row = remap_row(mapping, row, line)?;
        writer.serialize(&row)?;
        rows += 1;
    }
    writer.flush()?;

    debug!(rows, "Remapped family table");
    Ok(rows)
}
