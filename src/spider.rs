//! # Spider Module
//!
//! Defines the `Spider` trait and the cosme.net spider built on it.
//!
//! ## Overview
//!
//! A spider names the urls a crawl starts from and turns every fetched
//! [`Response`] into a [`ParseOutput`]: the records found on the page and the
//! requests to fetch next. The crawler shares one spider between all parser
//! workers, so `parse` takes `&self` and implementations keep no per-page state.
//!
//! ## CosmeSpider
//!
//! [`CosmeSpider`] drives the cosme.net crawl with a [`Router`]:
//!
//! 1. The rule that admitted the request picks the extractor for the page, if any.
//!    Start urls have no rule; they are followed but never extracted.
//! 2. When the rule follows, every `a[href]` on the page is resolved against the
//!    page url, stripped of its fragment, filtered to the allowed domains and
//!    routed. Links matched by a rule become requests tagged with that rule.
//!
//! An extractor failure (an unparseable identity) fails the whole page.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cosme_spider::{CosmeSpider, CrawlerBuilder};
//!
//! let spider = CosmeSpider::new().with_start_urls(["http://www.cosme.net/brand/brand_id/493/top"]);
//! let crawler = CrawlerBuilder::new(spider).build()?;
//! crawler.start_crawl().await?;
//! ```

use crate::error::SpiderError;
use crate::extract::selectors::LINK;
use crate::items::{CosmeItem, ScrapedItem};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use async_trait::async_trait;
use scraper::Html;
use std::collections::HashSet;
use tracing::{debug, trace, warn};
use url::Url;

const DEFAULT_START_URL: &str = "http://www.cosme.net/";
const DEFAULT_ALLOWED_DOMAIN: &str = "cosme.net";

/// Items and follow-up requests produced from one response.
#[derive(Debug, Clone)]
pub struct ParseOutput<I> {
    items: Vec<I>,
    requests: Vec<Request>,
}

impl<I> Default for ParseOutput<I> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            requests: Vec::new(),
        }
    }
}

impl<I> ParseOutput<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: I) {
        self.items.push(item);
    }

    pub fn add_items(&mut self, items: impl IntoIterator<Item = I>) {
        self.items.extend(items);
    }

    pub fn add_request(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn into_parts(self) -> (Vec<I>, Vec<Request>) {
        (self.items, self.requests)
    }
}

/// Defines the contract for a spider.
#[async_trait]
pub trait Spider: Send + Sync + 'static {
    /// The type of item that the spider scrapes.
    type Item: ScrapedItem;

    /// Returns the initial urls to start crawling from.
    fn start_urls(&self) -> Vec<String> {
        Vec::new()
    }

    /// Generates the initial requests to start crawling.
    fn start_requests(&self) -> Result<Vec<Request>, SpiderError> {
        self.start_urls()
            .iter()
            .map(|url| Ok::<_, SpiderError>(Request::new(Url::parse(url)?)))
            .collect()
    }

    /// Parses a response and extracts scraped items and new requests.
    async fn parse(&self, response: Response) -> Result<ParseOutput<Self::Item>, SpiderError>;
}

/// Rule-routed spider for cosme.net.
#[derive(Debug, Clone)]
pub struct CosmeSpider {
    start_urls: Vec<String>,
    allowed_domains: Vec<String>,
    router: Router,
}

impl Default for CosmeSpider {
    fn default() -> Self {
        Self {
            start_urls: vec![DEFAULT_START_URL.to_string()],
            allowed_domains: vec![DEFAULT_ALLOWED_DOMAIN.to_string()],
            router: Router::cosme(),
        }
    }
}

impl CosmeSpider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts discovered links to these domains and their subdomains.
    /// An empty list allows every host.
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Offsite filter: the host must equal an allowed domain or be a subdomain of one.
    pub fn is_allowed(&self, url: &Url) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        self.allowed_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// The synchronous part of `parse`. The document tree is not `Send` and must
    /// not outlive this call.
    fn parse_page(&self, response: &Response) -> Result<ParseOutput<CosmeItem>, SpiderError> {
        let (follow, extractor) = match response.request.rule {
            None => (true, None),
            Some(index) => match self.router.rule(index) {
                Some(rule) => (rule.follow, rule.extractor),
                None => {
                    warn!("Request for {} names unknown rule #{}", response.url, index);
                    (false, None)
                }
            },
        };

        let document = response.to_html();
        let mut output = ParseOutput::new();

        if let Some(extractor) = extractor {
            let items = extractor.extract(&document, &response.url)?;
            trace!("{:?} extractor produced {} items from {}", extractor, items.len(), response.url);
            output.add_items(items);
        }

        if follow {
            for request in self.discover_links(&document, &response.url) {
                output.add_request(request);
            }
        }

        Ok(output)
    }

    /// Routes the links of a followed page. Each distinct link is returned once.
    fn discover_links(&self, document: &Html, base: &Url) -> Vec<Request> {
        let mut seen = HashSet::new();
        let mut requests = Vec::new();

        for href in document
            .select(&LINK)
            .filter_map(|anchor| anchor.value().attr("href"))
        {
            let Ok(mut url) = base.join(href.trim()) else {
                trace!("Skipping unresolvable link {:?} on {}", href, base);
                continue;
            };
            url.set_fragment(None);
            if !matches!(url.scheme(), "http" | "https") {
                continue;
            }
            if !self.is_allowed(&url) {
                trace!("Filtered offsite link {}", url);
                continue;
            }
            let Some((index, _)) = self.router.route(&url) else {
                continue;
            };
            if seen.insert(url.as_str().to_string()) {
                requests.push(Request::new(url).with_rule(index));
            }
        }

        debug!("Discovered {} routable links on {}", requests.len(), base);
        requests
    }
}

#[async_trait]
impl Spider for CosmeSpider {
    type Item = CosmeItem;

    fn start_urls(&self) -> Vec<String> {
        self.start_urls.clone()
    }

    async fn parse(&self, response: Response) -> Result<ParseOutput<Self::Item>, SpiderError> {
        self.parse_page(&response)
    }
}
