//! Module for tracking the operational state of the crawler.
//!
//! `CrawlerState` counts the work in progress in each stage of the crawl:
//! - requests being downloaded,
//! - responses being parsed,
//! - items travelling through the pipelines.
//!
//! The crawler is idle, and may shut down, when all three are zero and the
//! scheduler queue is empty. The state also carries the first fatal pipeline
//! error, which ends the crawl early.

use crate::error::PipelineError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Represents the shared state of the crawler's various actors.
#[derive(Debug, Default)]
pub struct CrawlerState {
    /// The number of requests currently being downloaded.
    pub in_flight_requests: AtomicUsize,
    /// The number of responses currently being parsed.
    pub parsing_responses: AtomicUsize,
    /// The number of items currently being processed by pipelines.
    pub processing_items: AtomicUsize,
    fatal_error: Mutex<Option<PipelineError>>,
    fatal_notify: Notify,
}

impl CrawlerState {
    /// Creates a new, atomically reference-counted `CrawlerState`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Checks if all crawler activities are idle.
    pub fn is_idle(&self) -> bool {
        self.in_flight_requests.load(Ordering::SeqCst) == 0
            && self.parsing_responses.load(Ordering::SeqCst) == 0
            && self.processing_items.load(Ordering::SeqCst) == 0
    }

    /// Records a fatal error and wakes the crawler. Only the first error is kept.
    pub fn report_fatal(&self, error: PipelineError) {
        let mut slot = self.fatal_error.lock();
        if slot.is_none() {
            *slot = Some(error);
            self.fatal_notify.notify_one();
        }
    }

    pub fn has_fatal(&self) -> bool {
        self.fatal_error.lock().is_some()
    }

    pub fn take_fatal(&self) -> Option<PipelineError> {
        self.fatal_error.lock().take()
    }

    /// Resolves once a fatal error has been reported.
    pub async fn fatal_reported(&self) {
        self.fatal_notify.notified().await;
    }
}
