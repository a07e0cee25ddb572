//! Paginated fetcher for the upstream structure API.
//!
//! The upstream is a cursor paginator: each page embeds the absolute URL of the
//! next one. [`Paginator`] walks that chain strictly one page at a time:
//!
//! - a page with a `next` pointer moves the cursor forward; the next request
//!   waits for the politeness delay first
//! - a page without `next`, or a 204 response, ends the walk
//! - 408 responses are retried after the cooldown without limit
//! - other failures are retried after the cooldown up to the retry budget
//!
//! [`Paginator::items`] exposes the walk as a lazy stream of [`Item`]s so callers
//! never hold more than one page in memory.

use crate::config::{Config, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::fetch_with_retry;
use crate::types::{Item, Page};
use futures::stream::{self, Stream, TryStreamExt};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Outcome of one successful request
#[derive(Debug)]
enum PageResponse {
    /// A page body with results
    Page(Page),
    /// 204: the dataset ended before the cursor did
    NoContent,
}

/// Walks the upstream pagination chain
pub struct Paginator {
    /// HTTP client shared by every page request
    client: reqwest::Client,

    /// Retry policy applied per page
    retry: RetryConfig,

    /// Pause before each page after the first
    politeness_delay: Duration,

    /// Next page to request; `None` once the walk is done
    cursor: Option<Url>,

    /// Pages requested so far this run
    visited: HashSet<Url>,

    /// Last page URL a request was issued for
    last_url: Option<Url>,

    /// Pages received successfully
    pages_fetched: u64,

    /// Cursor failure found on the last page, reported after its items
    pending: Option<Error>,
}

impl Paginator {
    /// Create a paginator with its own HTTP client
    ///
    /// # Errors
    /// Returns error if the configured base URL is invalid or the HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch.request_timeout)
            .user_agent(config.fetch.user_agent.as_str())
            .build()?;

        Self::with_client(client, config)
    }

    /// Create a paginator that sends its requests through `client`
    ///
    /// # Errors
    /// Returns error if the configured base URL is invalid
    pub fn with_client(client: reqwest::Client, config: &Config) -> Result<Self> {
        let initial = config.initial_url()?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
            politeness_delay: config.fetch.politeness_delay,
            cursor: Some(initial),
            visited: HashSet::new(),
            last_url: None,
            pages_fetched: 0,
            pending: None,
        })
    }

    /// Number of pages received so far
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// The last page URL a request was issued for
    pub fn current_url(&self) -> Option<&Url> {
        self.last_url.as_ref()
    }

    /// True once the upstream has signalled the end of the data
    pub fn is_done(&self) -> bool {
        self.cursor.is_none() && self.pending.is_none()
    }

    /// Fetch the page under the cursor and advance the cursor past it
    ///
    /// Returns `Ok(None)` once the walk is done. A fatal error also ends the
    /// walk; [`current_url`](Self::current_url) still names the failing page.
    /// A bad `next` pointer does not discard the page carrying it: the page is
    /// returned and the error comes from the following call.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }

        let Some(url) = self.cursor.take() else {
            return Ok(None);
        };

        if self.pages_fetched > 0 {
            debug!(
                delay_ms = self.politeness_delay.as_millis() as u64,
                "Pausing before next page"
            );
            tokio::time::sleep(self.politeness_delay).await;
        }

        self.last_url = Some(url.clone());
        self.visited.insert(url.clone());

        let client = &self.client;
        let response = fetch_with_retry(&self.retry, url.as_str(), || {
            request_page(client, &url)
        })
        .await?;

        let page = match response {
            PageResponse::NoContent => {
                info!(url = %url, "Upstream has no more content");
                return Ok(None);
            }
            PageResponse::Page(page) => page,
        };

        self.cursor = match page.next.as_deref().filter(|next| !next.is_empty()) {
            Some(next) => match self.resolve_next(&url, next) {
                Ok(next_url) => Some(next_url),
                Err(e) => {
                    debug!(url = %url, error = %e, "Stopping after this page");
                    self.pending = Some(e);
                    None
                }
            },
            None => None,
        };
        self.pages_fetched += 1;

        info!(
            url = %url,
            page = self.pages_fetched,
            items = page.results.len(),
            has_next = self.cursor.is_some(),
            "Fetched page"
        );

        Ok(Some(page))
    }

    /// Lazily stream every item of every remaining page, in upstream order
    ///
    /// The stream ends after the last page or after the first fatal error.
    pub fn items(&mut self) -> impl Stream<Item = Result<Item>> + '_ {
        stream::try_unfold(self, |paginator| async move {
            let page = paginator.next_page().await?;
            Ok::<_, Error>(page.map(|page| (page.results, paginator)))
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<Item, Error>)))
        .try_flatten()
    }

    /// Turn a `next` pointer into the new cursor
    fn resolve_next(&self, current: &Url, next: &str) -> Result<Url> {
        let next_url = current.join(next).map_err(|e| Error::MalformedPage {
            url: current.to_string(),
            reason: format!("invalid next-page pointer {next:?}: {e}"),
        })?;

        if self.visited.contains(&next_url) {
            return Err(Error::CursorRevisited {
                url: next_url.to_string(),
            });
        }

        Ok(next_url)
    }
}

/// Issue one GET for `url` and map the response onto the pagination protocol
async fn request_page(client: &reqwest::Client, url: &Url) -> Result<PageResponse> {
    let response = client
        .get(url.clone())
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    match status {
        StatusCode::NO_CONTENT => return Ok(PageResponse::NoContent),
        StatusCode::REQUEST_TIMEOUT => {
            return Err(Error::RequestTimeout {
                url: url.to_string(),
            });
        }
        s if !s.is_success() => {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: s.as_u16(),
            });
        }
        _ => {}
    }

    let body = response.bytes().await?;
    let page = serde_json::from_slice::<Page>(&body).map_err(|e| Error::MalformedPage {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(PageResponse::Page(page))
}
