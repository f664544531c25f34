//! The `Crawler` that drives one crawl from the start URLs to closed output
//! streams.
//!
//! `start_crawl` opens the pipelines, seeds the scheduler, and spawns the
//! downloader, parser and item-processor tasks. It then waits until the crawl
//! goes idle, ctrl-c is pressed, or a pipeline reports a fatal error. Every one
//! of those ends in the same shutdown: stop the scheduler, drain the tasks,
//! close every pipeline.

use crate::downloader::Downloader;
use crate::error::{PipelineError, SpiderError};
use crate::items::ScrapedItem;
use crate::request::Request;
use crate::scheduler::Scheduler;
use crate::spider::Spider;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use futures_util::future::join_all;
use kanal::{AsyncReceiver, bounded_async};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use super::item_processor::SharedPipelines;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a spider against a downloader and a chain of item pipelines.
pub struct Crawler<S: Spider> {
    scheduler: Arc<Scheduler>,
    req_rx: AsyncReceiver<Request>,
    stats: Arc<StatCollector>,
    downloader: Arc<dyn Downloader>,
    spider: Arc<S>,
    pipelines: SharedPipelines<S::Item>,
    max_concurrent_downloads: usize,
    parser_workers: usize,
    max_concurrent_pipelines: usize,
    channel_capacity: usize,
}

impl<S: Spider> Crawler<S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        scheduler: Arc<Scheduler>,
        req_rx: AsyncReceiver<Request>,
        downloader: Arc<dyn Downloader>,
        spider: S,
        pipelines: SharedPipelines<S::Item>,
        max_concurrent_downloads: usize,
        parser_workers: usize,
        max_concurrent_pipelines: usize,
        channel_capacity: usize,
        stats: Arc<StatCollector>,
    ) -> Self {
        Crawler {
            scheduler,
            req_rx,
            stats,
            downloader,
            spider: Arc::new(spider),
            pipelines,
            max_concurrent_downloads,
            parser_workers,
            max_concurrent_pipelines,
            channel_capacity,
        }
    }

    /// Runs the crawl to completion.
    ///
    /// Returns `Err(SpiderError::Pipeline(..))` when a pipeline failed fatally
    /// during the crawl or while closing; the pipelines have been closed by then
    /// either way.
    pub async fn start_crawl(self) -> Result<(), SpiderError> {
        info!(
            "Crawler starting crawl with configuration: max_concurrent_downloads={}, parser_workers={}, max_concurrent_pipelines={}",
            self.max_concurrent_downloads, self.parser_workers, self.max_concurrent_pipelines
        );

        let Crawler {
            scheduler,
            req_rx,
            stats,
            downloader,
            spider,
            pipelines,
            max_concurrent_downloads,
            parser_workers,
            max_concurrent_pipelines,
            channel_capacity,
        } = self;

        let start_requests = spider.start_requests()?;

        if let Err(e) = open_pipelines(&pipelines).await {
            // close errors are logged; the open error is the one reported
            let _ = close_pipelines(&pipelines).await;
            return Err(e.into());
        }

        let state = CrawlerState::new();
        seed_scheduler(&scheduler, start_requests, &stats).await;

        let adaptive_channel_capacity = std::cmp::max(
            max_concurrent_downloads * 3,
            parser_workers * max_concurrent_pipelines * 2,
        )
        .max(channel_capacity);

        trace!(
            "Creating communication channels with capacity: {}",
            adaptive_channel_capacity
        );
        let (res_tx, res_rx) = bounded_async(adaptive_channel_capacity);
        let (item_tx, item_rx) = bounded_async(adaptive_channel_capacity);

        trace!("Spawning downloader task");
        let downloader_task = super::spawn_downloader_task(
            Arc::clone(&scheduler),
            req_rx,
            downloader,
            Arc::clone(&state),
            res_tx.clone(),
            max_concurrent_downloads,
            Arc::clone(&stats),
        );

        trace!("Spawning parser task");
        let parser_task = super::spawn_parser_task::<S>(
            Arc::clone(&scheduler),
            Arc::clone(&spider),
            Arc::clone(&state),
            res_rx,
            item_tx.clone(),
            parser_workers,
            Arc::clone(&stats),
        );

        trace!("Spawning item processor task");
        let item_processor_task = super::spawn_item_processor_task(
            Arc::clone(&state),
            item_rx,
            Arc::clone(&pipelines),
            max_concurrent_pipelines,
            Arc::clone(&stats),
        );

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, initiating graceful shutdown.");
            }
            _ = wait_until_idle(&scheduler, &state) => {
                info!("Crawl has become idle, initiating shutdown.");
            }
            _ = state.fatal_reported() => {
                error!("A pipeline failed fatally, initiating shutdown.");
            }
        };

        trace!("Closing communication channels");
        drop(res_tx);
        drop(item_tx);
        scheduler.shutdown();
        debug!("Scheduler shutdown initiated");

        let mut task_set = tokio::task::JoinSet::new();
        task_set.spawn(item_processor_task);
        task_set.spawn(parser_task);
        task_set.spawn(downloader_task);

        let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            while let Some(result) = task_set.join_next().await {
                match result {
                    Ok(Err(e)) | Err(e) => error!("Task failed during shutdown: {}", e),
                    Ok(Ok(())) => trace!("Task completed successfully during shutdown"),
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "Tasks did not complete within timeout ({}s), aborting remaining tasks and continuing with shutdown...",
                SHUTDOWN_TIMEOUT.as_secs()
            );
            task_set.abort_all();
        }

        let closed = close_pipelines(&pipelines).await;

        info!(
            "Crawl finished. Stats: requests_enqueued={}, requests_succeeded={}, pages_failed={}, items_scraped={}, items_exported={}",
            stats.requests_enqueued.load(Ordering::SeqCst),
            stats.requests_succeeded.load(Ordering::SeqCst),
            stats.pages_failed.load(Ordering::SeqCst),
            stats.items_scraped.load(Ordering::SeqCst),
            stats.items_exported.load(Ordering::SeqCst)
        );
        debug!("{}", stats);

        match state.take_fatal() {
            Some(e) => Err(SpiderError::Pipeline(e)),
            None => closed.map_err(SpiderError::Pipeline),
        }
    }

    /// Returns a cloned Arc to the `StatCollector` instance used by this crawler.
    ///
    /// This allows programmatic access to the collected statistics at any time during or after the crawl.
    pub fn get_stats(&self) -> Arc<StatCollector> {
        Arc::clone(&self.stats)
    }
}

async fn seed_scheduler(scheduler: &Scheduler, requests: Vec<Request>, stats: &StatCollector) {
    for mut request in requests {
        request.url.set_fragment(None);
        match scheduler.enqueue_request(request).await {
            Ok(true) => stats.increment_requests_enqueued(),
            Ok(false) => {}
            Err(e) => error!("Failed to enqueue initial request: {}", e),
        }
    }
}

// Idle must hold on two checks 50ms apart before the crawl is considered done.
async fn wait_until_idle(scheduler: &Scheduler, state: &CrawlerState) {
    loop {
        if scheduler.is_idle() && state.is_idle() {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if scheduler.is_idle() && state.is_idle() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

async fn open_pipelines<I: ScrapedItem>(pipelines: &SharedPipelines<I>) -> Result<(), PipelineError> {
    for pipeline in pipelines.iter() {
        debug!("Opening pipeline '{}'", pipeline.name());
        pipeline.open().await?;
    }
    Ok(())
}

/// Closes every pipeline and returns the first close error. Buffered stream
/// writes can fail only here.
async fn close_pipelines<I: ScrapedItem>(pipelines: &SharedPipelines<I>) -> Result<(), PipelineError> {
    info!("Closing item pipelines...");
    let closing: Vec<_> = pipelines.iter().map(|p| p.close()).collect();
    let mut first_error = None;
    for (pipeline, result) in pipelines.iter().zip(join_all(closing).await) {
        if let Err(e) = result {
            error!("Failed to close pipeline '{}': {}", pipeline.name(), e);
            first_error.get_or_insert(e);
        }
    }
    debug!("All item pipelines closed");
    first_error.map_or(Ok(()), Err)
}
