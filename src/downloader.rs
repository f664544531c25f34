//! # Downloader Module
//!
//! The fetch side of the crawl: turns a [`Request`] into a [`Response`].
//!
//! [`ReqwestDownloader`] is the default implementation. It keeps one pooled
//! `reqwest::Client` and spaces consecutive requests to the same host by the
//! configured download delay, whatever the number of concurrent downloads.

use crate::error::SpiderError;
use crate::request::Request;
use crate::response::Response;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

#[async_trait]
pub trait Downloader: Send + Sync + 'static {
    async fn download(&self, request: Request) -> Result<Response, SpiderError>;
}

/// Settings of the default downloader.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Minimum spacing between two requests to the same host.
    pub download_delay: Duration,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        DownloaderConfig {
            user_agent: concat!("cosme-spider/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            download_delay: Duration::from_secs(1),
        }
    }
}

pub struct ReqwestDownloader {
    client: reqwest::Client,
    download_delay: Duration,
    /// Earliest instant the next request to each host may start.
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl ReqwestDownloader {
    pub fn new(config: DownloaderConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            download_delay: config.download_delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until `host` may be hit again and reserves the following slot.
    async fn wait_for_slot(&self, host: &str) {
        if self.download_delay.is_zero() {
            return;
        }
        let start = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let start = slots.get(host).copied().map_or(now, |next| next.max(now));
            slots.insert(host.to_string(), start + self.download_delay);
            start
        };
        if start > Instant::now() {
            trace!("Delaying request to {} by {:?}", host, start - Instant::now());
            tokio::time::sleep_until(start).await;
        }
    }
}

impl Default for ReqwestDownloader {
    fn default() -> Self {
        Self::new(DownloaderConfig::default())
    }
}

#[async_trait]
impl Downloader for ReqwestDownloader {
    async fn download(&self, request: Request) -> Result<Response, SpiderError> {
        let host = request.url.host_str().unwrap_or_default().to_string();
        self.wait_for_slot(&host).await;

        debug!("Downloading {}", request.url);
        let download_error = |e: reqwest::Error| SpiderError::Download {
            url: request.url.to_string(),
            message: e.to_string(),
        };

        let resp = self
            .client
            .get(request.url.clone())
            .send()
            .await
            .map_err(download_error)?;
        let status = resp.status().as_u16();
        let final_url = resp.url().clone();
        let body = resp.bytes().await.map_err(download_error)?;

        let mut response = Response::new(request, status, body);
        response.url = final_url;
        Ok(response)
    }
}
