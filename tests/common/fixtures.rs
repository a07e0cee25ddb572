//! Upstream payload fixtures and fast test configuration

use pdb_pfam_export::config::{Config, FetchConfig, RetryConfig};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockBuilder, MockServer};

/// Path the first page is served from on the mock server
pub const FIRST_PAGE_PATH: &str = "/interpro/api/structure/PDB/entry/pfam";

/// Config pointing at `server` with millisecond delays
pub fn fast_config(server: &MockServer) -> Config {
    Config {
        fetch: FetchConfig {
            base_url: format!("{}{}", server.uri(), FIRST_PAGE_PATH),
            politeness_delay: Duration::from_millis(20),
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        },
        retry: RetryConfig {
            max_attempts: 3,
            cooldown: Duration::from_millis(10),
        },
    }
}

/// Absolute URL of the first page as the paginator requests it
pub fn first_page_url(server: &MockServer) -> String {
    format!("{}{}?page_size=200", server.uri(), FIRST_PAGE_PATH)
}

/// Matcher for requests to the first page
pub fn first_page() -> MockBuilder {
    Mock::given(method("GET"))
        .and(path(FIRST_PAGE_PATH))
        .and(query_param("page_size", "200"))
}

/// Matcher for requests to a follow-up page served at `page_path`
pub fn page_at(page_path: &str) -> MockBuilder {
    Mock::given(method("GET")).and(path(page_path.to_string()))
}

/// A structure record with one sub-entry per `(pfam accession, chain)`
pub fn structure(accession: &str, entries: &[(&str, &str)]) -> Value {
    json!({
        "metadata": {
            "accession": accession,
            "name": format!("structure {accession}"),
            "source_database": "pdb",
            "experiment_type": "x-ray"
        },
        "entry_subset": entries
            .iter()
            .map(|(acc, chain)| json!({
                "accession": acc,
                "chain": chain,
                "source_database": "pfam",
                "entry_type": "domain"
            }))
            .collect::<Vec<_>>()
    })
}

/// A page body with the given items and optional next pointer
pub fn page(results: Vec<Value>, next: Option<String>) -> Value {
    json!({
        "count": results.len(),
        "next": next,
        "previous": null,
        "results": results
    })
}
