//! Core types: upstream pages and items, flattened output rows

use serde::{Deserialize, Serialize};

/// One upstream response body
///
/// Only the fields the exporter consumes are modelled; anything else in the
/// payload (such as `count` or `previous`) is ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct Page {
    /// Result items in upstream order
    pub results: Vec<Item>,

    /// Absolute URL of the following page; `None` on the last page
    #[serde(default)]
    pub next: Option<String>,
}

/// One upstream result record, kept opaque until it is flattened
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Item(pub serde_json::Value);

impl Item {
    /// Accession under `metadata.accession`, if present and a string
    pub fn accession(&self) -> Option<&str> {
        self.0.get("metadata")?.get("accession")?.as_str()
    }
}

/// Typed view of an [`Item`] with just the fields the flattener reads
#[derive(Clone, Debug, Deserialize)]
pub struct StructureRecord {
    /// Structure metadata
    pub metadata: StructureMetadata,

    /// Pfam entries mapped onto this structure, one per chain
    pub entry_subset: Vec<SubEntry>,
}

/// Metadata block of a structure record
#[derive(Clone, Debug, Deserialize)]
pub struct StructureMetadata {
    /// PDB accession, e.g. `1abc`
    pub accession: String,
}

/// A Pfam entry attached to one chain of a structure
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SubEntry {
    /// Pfam accession, e.g. `PF00001`
    pub accession: String,

    /// Chain identifier within the structure
    pub chain: String,
}

/// One flat output record
///
/// Field order is the column order of the CSV output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    /// Pfam accession of the sub-entry
    pub pfam_acc: String,

    /// `{structure accession}_{chain}`
    pub structure: String,
}

impl OutputRow {
    /// Build the row for one sub-entry of the structure `accession`
    pub fn new(accession: &str, entry: &SubEntry) -> Self {
        Self {
            pfam_acc: entry.accession.clone(),
            structure: format!("{}_{}", accession, entry.chain),
        }
    }
}

/// Totals reported after an export run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Pages fetched successfully
    pub pages: u64,

    /// Items consumed from those pages
    pub items: u64,

    /// Rows written to the sink
    pub rows: u64,
}
