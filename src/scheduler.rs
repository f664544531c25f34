//! # Scheduler Module
//!
//! The crawl frontier: admits requests, drops duplicates, and hands requests to
//! the downloader.
//!
//! ## Overview
//!
//! Every admitted request is keyed by its [`Request::fingerprint`] (the url
//! without fragment). A fingerprint is admitted at most once per crawl, so each
//! page is fetched at most once however many pages link to it. Records are not
//! deduplicated here; two distinct urls showing the same entity both produce it.
//!
//! Requests flow to the downloader over an unbounded channel. The number of
//! queued requests is capped by `max_pending_requests`; past the cap a request
//! is rejected and its fingerprint released so a later link may admit it again.
//!
//! ## Example
//!
//! ```rust,ignore
//! let (scheduler, request_receiver) = Scheduler::new(10_000);
//! let request = Request::new(Url::parse("http://www.cosme.net/")?);
//! assert!(scheduler.enqueue_request(request.clone()).await?);
//! assert!(!scheduler.enqueue_request(request).await?);
//! ```

use crate::error::SpiderError;
use crate::request::Request;
use dashmap::DashSet;
use kanal::{AsyncReceiver, AsyncSender, unbounded_async};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace, warn};

pub struct Scheduler {
    tx: AsyncSender<Request>,
    seen: DashSet<String>,
    pub(crate) is_shutting_down: AtomicBool,
    max_pending_requests: usize,
}

impl Scheduler {
    /// Creates a new `Scheduler` and returns it with the receiving end of its queue.
    pub fn new(max_pending_requests: usize) -> (Arc<Self>, AsyncReceiver<Request>) {
        let (tx, rx) = unbounded_async();
        info!(
            "Scheduler created with max pending requests: {}",
            max_pending_requests
        );
        let scheduler = Arc::new(Scheduler {
            tx,
            seen: DashSet::new(),
            is_shutting_down: AtomicBool::new(false),
            max_pending_requests,
        });
        (scheduler, rx)
    }

    /// Admits `request` to the frontier.
    ///
    /// Returns `Ok(false)` when its fingerprint was already admitted.
    pub async fn enqueue_request(&self, request: Request) -> Result<bool, SpiderError> {
        if self.is_shutting_down.load(Ordering::SeqCst) {
            return Err(SpiderError::GeneralError(
                "Scheduler is shutting down, request rejected.".into(),
            ));
        }

        let fingerprint = request.fingerprint();
        if !self.seen.insert(fingerprint.clone()) {
            trace!("Request already seen, skipping: {}", request.url);
            return Ok(false);
        }

        if self.len() >= self.max_pending_requests {
            warn!(
                "Maximum pending requests reached ({}), request dropped due to backpressure: {}",
                self.max_pending_requests, request.url
            );
            self.seen.remove(&fingerprint);
            return Err(SpiderError::GeneralError(
                "Scheduler at maximum capacity, request dropped due to backpressure.".into(),
            ));
        }

        trace!("Enqueuing request: {}", request.url);
        if self.tx.send(request).await.is_err() {
            self.seen.remove(&fingerprint);
            return Err(SpiderError::GeneralError(
                "Scheduler channel closed, request dropped.".into(),
            ));
        }
        Ok(true)
    }

    /// Stops admitting requests. The downloader exits on the same flag.
    pub fn shutdown(&self) {
        if !self.is_shutting_down.swap(true, Ordering::SeqCst) {
            debug!(
                "Scheduler shutting down with {} pending requests and {} seen urls",
                self.len(),
                self.seen.len()
            );
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::SeqCst)
    }

    /// Returns the number of pending requests in the scheduler.
    #[inline]
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the scheduler is idle (has no pending requests).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.is_empty()
    }
}
