//! Error types for pdb-pfam-export
//!
//! The variants mirror how a run can fail:
//! - transport and HTTP status failures while paginating (some retryable)
//! - malformed upstream payloads (never retried)
//! - local sink and configuration problems
//! - unknown categories in the remap transform

use thiserror::Error;

/// Result type alias for pdb-pfam-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pdb-pfam-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.base_url")
        key: Option<String>,
    },

    /// Transport-level failure (connect, reset, client timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Upstream answered with a non-success status other than 204 or 408
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The page URL that was requested
        url: String,
        /// The status code returned
        status: u16,
    },

    /// Upstream answered 408: the query ran past its server-side timeout
    #[error("upstream timed out serving {url}")]
    RequestTimeout {
        /// The page URL that timed out
        url: String,
    },

    /// Page body could not be decoded or lacks the `results` array
    #[error("malformed page from {url}: {reason}")]
    MalformedPage {
        /// The page URL whose body was malformed
        url: String,
        /// What was wrong with the payload
        reason: String,
    },

    /// A result item is missing fields the flattener depends on
    #[error("malformed item {}: {reason}", .accession.as_deref().unwrap_or("<unknown accession>"))]
    MalformedItem {
        /// Accession of the item, when it could be read
        accession: Option<String>,
        /// What was wrong with the item
        reason: String,
    },

    /// Upstream pointed the cursor back at a page already fetched this run
    #[error("next-page pointer revisits {url}")]
    CursorRevisited {
        /// The repeated page URL
        url: String,
    },

    /// Counted failures on one page exhausted the retry budget
    #[error("giving up on {url} after {attempts} retries: {source}")]
    RetriesExhausted {
        /// The last-attempted page URL
        url: String,
        /// Number of retries performed before giving up
        attempts: u32,
        /// The final failure
        #[source]
        source: Box<Error>,
    },

    /// Remap input header does not match the fixed family table columns
    #[error("family table columns do not match: missing {missing:?}, unexpected {unexpected:?}")]
    ColumnMismatch {
        /// Expected columns absent from the input header
        missing: Vec<String>,
        /// Input columns outside the expected set
        unexpected: Vec<String>,
    },

    /// Remap input carried a category with no entry in the lookup table
    #[error("unknown category {value:?} on line {line}")]
    UnknownCategory {
        /// The unrecognized category value
        value: String,
        /// 1-based input line of the offending record (header is line 1)
        line: u64,
    },
}

impl Error {
    /// The page URL this error relates to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::HttpStatus { url, .. }
            | Error::RequestTimeout { url }
            | Error::MalformedPage { url, .. }
            | Error::CursorRevisited { url }
            | Error::RetriesExhausted { url, .. } => Some(url.as_str()),
            Error::Network(e) => e.url().map(|u| u.as_str()),
            _ => None,
        }
    }
}
