//! # Statistics Module
//!
//! Collects metrics about a crawl while it runs.
//!
//! ## Overview
//!
//! The `StatCollector` is shared by every crawler task and updated with atomic
//! operations. It tracks:
//!
//! - **Requests**: enqueued, sent, succeeded, failed
//! - **Responses**: received, status code distribution, bytes downloaded
//! - **Pages**: parsed, and failed extractions (unparseable identities)
//! - **Items**: scraped, exported, dropped by a pipeline, and scraped per item type
//!
//! A report is available through `Display` and as JSON.
//!
//! ## Example
//!
//! ```rust,ignore
//! let crawler = CrawlerBuilder::new(CosmeSpider::new()).build()?;
//! let stats = crawler.get_stats();
//! crawler.start_crawl().await?;
//! println!("{}", stats);
//! println!("{}", stats.to_json_string_pretty()?);
//! ```

use crate::error::SpiderError;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

// A consistent copy of the counters, shared by every report format.
#[derive(Debug, Serialize)]
struct StatsSnapshot {
    requests_enqueued: usize,
    requests_sent: usize,
    requests_succeeded: usize,
    requests_failed: usize,
    responses_received: usize,
    total_bytes_downloaded: usize,
    pages_parsed: usize,
    pages_failed: usize,
    items_scraped: usize,
    items_exported: usize,
    items_dropped_by_pipeline: usize,
    items_by_type: BTreeMap<String, usize>,
    response_status_counts: BTreeMap<u16, usize>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    elapsed_duration: Duration,
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl StatsSnapshot {
    fn per_second(&self, count: usize) -> f64 {
        let secs = self.elapsed_duration.as_secs_f64();
        if secs > 0.0 { count as f64 / secs } else { 0.0 }
    }

    fn formatted_bytes(&self) -> String {
        let mut size = self.total_bytes_downloaded as f64;
        for unit in ["B", "KB", "MB"] {
            if size < 1024.0 {
                return if unit == "B" {
                    format!("{} B", self.total_bytes_downloaded)
                } else {
                    format!("{:.2} {}", size, unit)
                };
            }
            size /= 1024.0;
        }
        format!("{:.2} GB", size)
    }
}

/// Collects and stores various statistics about the crawler's operation.
#[derive(Debug)]
pub struct StatCollector {
    pub start_time: Instant,

    pub requests_enqueued: AtomicUsize,
    pub requests_sent: AtomicUsize,
    pub requests_succeeded: AtomicUsize,
    pub requests_failed: AtomicUsize,

    pub responses_received: AtomicUsize,
    pub response_status_counts: DashMap<u16, usize>,
    pub total_bytes_downloaded: AtomicUsize,

    pub pages_parsed: AtomicUsize,
    pub pages_failed: AtomicUsize,

    pub items_scraped: AtomicUsize,
    pub items_exported: AtomicUsize,
    pub items_dropped_by_pipeline: AtomicUsize,
    pub items_by_type: DashMap<&'static str, usize>,
}

impl StatCollector {
    /// Creates a new `StatCollector` with all counters initialized to zero.
    pub fn new() -> Self {
        StatCollector {
            start_time: Instant::now(),
            requests_enqueued: AtomicUsize::new(0),
            requests_sent: AtomicUsize::new(0),
            requests_succeeded: AtomicUsize::new(0),
            requests_failed: AtomicUsize::new(0),
            responses_received: AtomicUsize::new(0),
            response_status_counts: DashMap::new(),
            total_bytes_downloaded: AtomicUsize::new(0),
            pages_parsed: AtomicUsize::new(0),
            pages_failed: AtomicUsize::new(0),
            items_scraped: AtomicUsize::new(0),
            items_exported: AtomicUsize::new(0),
            items_dropped_by_pipeline: AtomicUsize::new(0),
            items_by_type: DashMap::new(),
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_enqueued: self.requests_enqueued.load(Ordering::SeqCst),
            requests_sent: self.requests_sent.load(Ordering::SeqCst),
            requests_succeeded: self.requests_succeeded.load(Ordering::SeqCst),
            requests_failed: self.requests_failed.load(Ordering::SeqCst),
            responses_received: self.responses_received.load(Ordering::SeqCst),
            total_bytes_downloaded: self.total_bytes_downloaded.load(Ordering::SeqCst),
            pages_parsed: self.pages_parsed.load(Ordering::SeqCst),
            pages_failed: self.pages_failed.load(Ordering::SeqCst),
            items_scraped: self.items_scraped.load(Ordering::SeqCst),
            items_exported: self.items_exported.load(Ordering::SeqCst),
            items_dropped_by_pipeline: self.items_dropped_by_pipeline.load(Ordering::SeqCst),
            items_by_type: self
                .items_by_type
                .iter()
                .map(|entry| (entry.key().to_string(), *entry.value()))
                .collect(),
            response_status_counts: self
                .response_status_counts
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect(),
            elapsed_duration: self.start_time.elapsed(),
        }
    }

    pub(crate) fn increment_requests_enqueued(&self) {
        self.requests_enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_responses_received(&self) {
        self.responses_received.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_response_status(&self, status_code: u16) {
        *self.response_status_counts.entry(status_code).or_insert(0) += 1;
    }

    pub(crate) fn add_bytes_downloaded(&self, bytes: usize) {
        self.total_bytes_downloaded.fetch_add(bytes, Ordering::SeqCst);
    }

    pub(crate) fn increment_pages_parsed(&self) {
        self.pages_parsed.fetch_add(1, Ordering::SeqCst);
    }

    /// A page whose records could not be built.
    pub(crate) fn increment_pages_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_item_scraped(&self, item_type: &'static str) {
        self.items_scraped.fetch_add(1, Ordering::SeqCst);
        *self.items_by_type.entry(item_type).or_insert(0) += 1;
    }

    pub(crate) fn increment_items_exported(&self) {
        self.items_exported.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_items_dropped_by_pipeline(&self) {
        self.items_dropped_by_pipeline.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of scraped items of `item_type`.
    pub fn items_of_type(&self, item_type: &str) -> usize {
        self.items_by_type.get(item_type).map_or(0, |count| *count)
    }

    /// Converts the current statistics into a JSON string.
    pub fn to_json_string(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Converts the current statistics into a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

impl Default for StatCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StatCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nCrawl Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "  duration : {:?}", snapshot.elapsed_duration)?;
        writeln!(
            f,
            "  speed    : page/s: {:.2}, item/s: {:.2}",
            snapshot.per_second(snapshot.pages_parsed),
            snapshot.per_second(snapshot.items_scraped)
        )?;
        writeln!(
            f,
            "  requests : enqueued: {}, sent: {}, ok: {}, fail: {}",
            snapshot.requests_enqueued,
            snapshot.requests_sent,
            snapshot.requests_succeeded,
            snapshot.requests_failed
        )?;
        writeln!(
            f,
            "  response : received: {}, downloaded: {}",
            snapshot.responses_received,
            snapshot.formatted_bytes()
        )?;
        writeln!(
            f,
            "  pages    : parsed: {}, failed: {}",
            snapshot.pages_parsed, snapshot.pages_failed
        )?;
        writeln!(
            f,
            "  items    : scraped: {}, exported: {}, dropped: {}",
            snapshot.items_scraped, snapshot.items_exported, snapshot.items_dropped_by_pipeline
        )?;

        let join = |pairs: Vec<String>| {
            if pairs.is_empty() {
                "none".to_string()
            } else {
                pairs.join(", ")
            }
        };
        let by_type = join(
            snapshot
                .items_by_type
                .iter()
                .map(|(kind, count)| format!("{}: {}", kind, count))
                .collect(),
        );
        let status = join(
            snapshot
                .response_status_counts
                .iter()
                .map(|(code, count)| format!("{}: {}", code, count))
                .collect(),
        );

        writeln!(f, "  by type  : {}", by_type)?;
        writeln!(f, "  status   : {}\n", status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_items_per_type() {
        let stats = StatCollector::new();
        stats.record_item_scraped("review");
        stats.record_item_scraped("review");
        stats.record_item_scraped("brand");

        assert_eq!(stats.items_scraped.load(Ordering::SeqCst), 3);
        assert_eq!(stats.items_of_type("review"), 2);
        assert_eq!(stats.items_of_type("brand"), 1);
        assert_eq!(stats.items_of_type("user"), 0);
    }

    #[test]
    fn reports_render_all_sections() {
        let stats = StatCollector::new();
        stats.increment_requests_enqueued();
        stats.increment_pages_parsed();
        stats.increment_pages_failed();
        stats.record_response_status(200);
        stats.record_response_status(404);
        stats.record_item_scraped("product");

        let text = stats.to_string();
        assert!(text.contains("parsed: 1, failed: 1"));
        assert!(text.contains("product: 1"));
        assert!(text.contains("200: 1, 404: 1"));

        let json: serde_json::Value = serde_json::from_str(&stats.to_json_string().unwrap()).unwrap();
        assert_eq!(json["requests_enqueued"], 1);
        assert_eq!(json["items_by_type"]["product"], 1);
        assert_eq!(json["response_status_counts"]["404"], 1);
        assert!(json["elapsed_secs"].is_f64());
    }
}
