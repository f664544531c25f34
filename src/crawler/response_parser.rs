//! # Response Parser Module
//!
//! Runs downloaded responses through the spider.
//!
//! ## Architecture
//!
//! A coordinator task receives responses from the downloader and hands them to
//! a fixed pool of `parser_workers` worker tasks over an internal channel. Each
//! worker calls `Spider::parse` and routes the output with
//! [`process_crawl_outputs`]: discovered requests go back to the scheduler,
//! items go to the item processor.
//!
//! A page whose extraction fails is logged and counted; the crawl goes on.
//!
//! Every response arrives already counted in `parsing_responses`; the worker
//! releases that count only after the page's requests and items have been
//! handed on, so the crawl never looks idle while a page is being routed.

use crate::items::ScrapedItem;
use crate::response::Response;
use crate::scheduler::Scheduler;
use crate::spider::{ParseOutput, Spider};
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use kanal::{AsyncReceiver, AsyncSender};
use log::{debug, error, info, trace, warn};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::task::JoinSet;

pub fn spawn_parser_task<S>(
    scheduler: Arc<Scheduler>,
    spider: Arc<S>,
    state: Arc<CrawlerState>,
    res_rx: AsyncReceiver<Response>,
    item_tx: AsyncSender<S::Item>,
    parser_workers: usize,
    stats: Arc<StatCollector>,
) -> tokio::task::JoinHandle<()>
where
    S: Spider + 'static,
{
    let (internal_parse_tx, internal_parse_rx) =
        kanal::bounded_async::<Response>(parser_workers * 2);

    let mut workers = JoinSet::new();
    for _ in 0..parser_workers {
        let internal_parse_rx = internal_parse_rx.clone();
        let spider = Arc::clone(&spider);
        let scheduler = Arc::clone(&scheduler);
        let item_tx = item_tx.clone();
        let state = Arc::clone(&state);
        let stats = Arc::clone(&stats);

        workers.spawn(async move {
            while let Ok(response) = internal_parse_rx.recv().await {
                let url = response.url.clone();
                debug!("Parsing response from {}", url);

                match spider.parse(response).await {
                    Ok(outputs) => {
                        stats.increment_pages_parsed();
                        process_crawl_outputs::<S>(
                            outputs,
                            &scheduler,
                            &item_tx,
                            &state,
                            &stats,
                        )
                        .await;
                    }
                    Err(e) if e.is_page_level() => {
                        warn!("Skipping records of {}: {}", url, e);
                        stats.increment_pages_failed();
                    }
                    Err(e) => {
                        error!("Spider parsing error on {}: {}", url, e);
                        stats.increment_pages_failed();
                    }
                }
                state.parsing_responses.fetch_sub(1, Ordering::SeqCst);
            }
        });
    }
    drop(internal_parse_rx);

    tokio::spawn(async move {
        trace!(
            "Response parser coordinator started with {} workers",
            parser_workers
        );
        while let Ok(response) = res_rx.recv().await {
            trace!("Received response for parsing from URL: {}", response.url);

            if item_tx.len() > parser_workers * 2 {
                trace!(
                    "Applying backpressure to parser, item channel occupancy: {}",
                    item_tx.len()
                );
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            if internal_parse_tx.send(response).await.is_err() {
                error!("Internal parse channel closed, cannot send response to parser worker.");
                state.parsing_responses.fetch_sub(1, Ordering::SeqCst);
            }
        }

        trace!("Closing internal parse channel");
        drop(internal_parse_tx);

        trace!("Waiting for parsing worker tasks to complete");
        while let Some(res) = workers.join_next().await {
            if let Err(e) = res {
                error!("A parsing worker task failed: {:?}", e);
            }
        }
        trace!("Response parser coordinator finished");
    })
}

/// Enqueues the discovered requests and forwards the items of one parsed page.
pub async fn process_crawl_outputs<S>(
    outputs: ParseOutput<S::Item>,
    scheduler: &Scheduler,
    item_tx: &AsyncSender<S::Item>,
    state: &CrawlerState,
    stats: &StatCollector,
) where
    S: Spider + 'static,
{
    let (items, requests) = outputs.into_parts();
    let items_len = items.len();
    let requests_len = requests.len();

    if requests_len > 0 || items_len > 0 {
        info!(
            "Processing {} requests and {} items from spider output.",
            requests_len, items_len
        );
    } else {
        trace!("Spider output contained no requests or items");
    }

    let mut admitted = 0;
    let mut request_error_total = 0;
    for request in requests {
        if scheduler.is_shutting_down() {
            trace!("Scheduler is shutting down, skipping request: {}", request.url);
            request_error_total += 1;
            continue;
        }

        match scheduler.enqueue_request(request).await {
            Ok(true) => {
                admitted += 1;
                stats.increment_requests_enqueued();
            }
            Ok(false) => {}
            Err(e) => {
                debug!("Failed to enqueue request: {}", e);
                request_error_total += 1;
            }
        }
    }

    if request_error_total > 0 {
        warn!(
            "Failed to enqueue {} of {} requests.",
            request_error_total, requests_len
        );
    } else if requests_len > 0 {
        debug!(
            "Admitted {} new requests of {} discovered",
            admitted, requests_len
        );
    }

    let mut item_error_total = 0;
    for (idx, item) in items.into_iter().enumerate() {
        if item_tx.is_closed() {
            warn!("Item channel is closed, stopping item processing");
            item_error_total += items_len - idx;
            break;
        }

        stats.record_item_scraped(item.item_type());
        state.processing_items.fetch_add(1, Ordering::SeqCst);
        if item_tx.send(item).await.is_err() {
            error!("Failed to send item to processing channel");
            item_error_total += 1;
            state.processing_items.fetch_sub(1, Ordering::SeqCst);
        }
    }

    if item_error_total > 0 {
        warn!(
            "Failed to send {} of {} scraped items.",
            item_error_total, items_len
        );
    }
}
