//! Listing page fetching.
//!
//! The collection loop only needs "give me the final document for this URL";
//! everything else about the transport lives behind [`PageFetcher`]. A fresh
//! fetcher is acquired for every attempt and dropped when the attempt ends,
//! so a wedged connection never leaks into the next try.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{Error, Result, NAV_TIMEOUT_SECS};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the listing document at `url`. The returned HTML is expected
    /// to already contain the row markup; waiting for rendering is the
    /// fetcher's problem, bounded by its own timeout.
    async fn fetch_listing(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher over a `reqwest` client with a bounded per-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(NAV_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_listing(&self, url: &str) -> Result<String> {
        let res = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::NavigationTimeout(url.to_string())
            } else {
                Error::Reqwest(e)
            }
        })?;
        let res = res.error_for_status()?;
        Ok(res.text().await?)
    }
}
