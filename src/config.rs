//! Configuration types for pdb-pfam-export

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// InterPro endpoint listing PDB structures together with their Pfam entries
pub const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/interpro/api/structure/PDB/entry/pfam";

/// Number of results requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Upstream pagination settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Endpoint of the first page, without the page size parameter
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Results per page, sent as `page_size` (default: 200)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pause before requesting the page after a successful one (default: 1 second)
    #[serde(default = "default_politeness_delay", with = "duration_serde")]
    pub politeness_delay: Duration,

    /// Client-side limit on a single request (default: 180 seconds)
    ///
    /// Hitting this limit is a transport failure and counts against the retry budget,
    /// unlike a 408 answered by the server.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            politeness_delay: default_politeness_delay(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry policy for a single page
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Consecutive counted failures tolerated before the run aborts (default: 3)
    ///
    /// Server-side timeouts (HTTP 408) never count toward this budget.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait before retrying the same page (default: 61 seconds)
    #[serde(default = "default_cooldown", with = "duration_serde")]
    pub cooldown: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            cooldown: default_cooldown(),
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream pagination settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from a JSON file; omitted keys take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })
    }

    /// URL of the first page: the base URL with the page size appended
    pub fn initial_url(&self) -> Result<Url> {
        if self.fetch.page_size == 0 {
            return Err(Error::Config {
                message: "page size must be greater than zero".to_string(),
                key: Some("fetch.page_size".to_string()),
            });
        }

        let mut url = Url::parse(&self.fetch.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL {:?}: {}", self.fetch.base_url, e),
            key: Some("fetch.base_url".to_string()),
        })?;
        url.query_pairs_mut()
            .append_pair("page_size", &self.fetch.page_size.to_string());
        Ok(url)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_politeness_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(180)
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    3
}

fn default_cooldown() -> Duration {
    Duration::from_secs(61)
}

// Durations are whole seconds on the wire
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
