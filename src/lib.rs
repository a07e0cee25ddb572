//! # pdb-pfam-export
//!
//! Streams the InterPro mapping of PDB structure chains to Pfam entries into a
//! two-column CSV (`pfam_acc,structure`).
//!
//! The upstream API is paged with a cursor that each page carries to the next.
//! Pages are fetched one at a time, items are flattened and written as they
//! arrive, and nothing beyond the current page is held in memory. Transient
//! upstream failures are retried:
//! - HTTP 408 (the server gave up on a slow query) is retried after a cooldown, always
//! - any other failure is retried after the same cooldown, at most three times in a row
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdb_pfam_export::{Config, export};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = export(&Config::default(), std::io::stdout().lock()).await?;
//!     eprintln!("{} rows from {} pages", summary.rows, summary.pages);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Export pipeline
pub mod export;
/// Paginated upstream fetcher
pub mod fetcher;
/// Record flattening and CSV output
pub mod flatten;
/// Category remapping for family tables
pub mod remap;
/// Retry classification and bounded retry loop
pub mod retry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, FetchConfig, RetryConfig};
pub use error::{Error, Result};
pub use export::{export, export_with};
pub use fetcher::Paginator;
pub use flatten::{RowWriter, flatten_item};
pub use remap::{CategoryMapping, FamilyRow, remap_csv};
pub use types::{ExportSummary, Item, OutputRow, Page, SubEntry};
