use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use tracing::{debug, warn};

const REQUEST_TIMEOUT_SECS: u64 = 20;
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static CLIENT: OnceCell<Client> = OnceCell::new();

fn listing_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}

pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let client = listing_client()?;
        let resp = client.get(url).send().context("request failed")?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {} for {}", status, url));
        }
        Ok(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Fixed-delay retries; the last error is returned once attempts run out.
pub fn fetch_with_retry<F: PageFetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    policy: RetryPolicy,
) -> Result<String> {
    let attempts = policy.attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match fetcher.fetch(url) {
            Ok(body) => {
                debug!(url, attempt, bytes = body.len(), "page fetched");
                return Ok(body);
            }
            Err(err) => {
                warn!(url, attempt, attempts, error = %err, "page fetch failed");
                last_err = Some(err);
                if attempt < attempts && !policy.delay.is_zero() {
                    thread::sleep(policy.delay);
                }
            }
        }
    }
    let err = last_err.unwrap_or_else(|| anyhow!("no fetch attempts made"));
    Err(err.context(format!("failed to fetch {url} after {attempts} attempts")))
}

pub fn page_urls(base: &str, pages: u32) -> Vec<String> {
    (1..=pages).map(|page| format!("{base}{page}")).collect()
}
