//! Contains the request handling logic for the crawler.
//!
//! The downloader task receives requests from the scheduler, downloads them with
//! at most `max_concurrent_downloads` in flight, and forwards successful
//! responses to the parser task. It holds back while the response channel is
//! filling up, and exits once the scheduler shuts down or its channel closes.

use crate::downloader::Downloader;
use crate::request::Request;
use crate::response::Response;
use crate::scheduler::Scheduler;
use crate::state::CrawlerState;
use crate::stats::StatCollector;

use kanal::{AsyncReceiver, AsyncSender};
use log::{debug, error, trace, warn};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub fn spawn_downloader_task(
    scheduler: Arc<Scheduler>,
    req_rx: AsyncReceiver<Request>,
    downloader: Arc<dyn Downloader>,
    state: Arc<CrawlerState>,
    res_tx: AsyncSender<Response>,
    max_concurrent_downloads: usize,
    stats: Arc<StatCollector>,
) -> tokio::task::JoinHandle<()> {
    let semaphore = Arc::new(Semaphore::new(max_concurrent_downloads));
    let mut tasks = JoinSet::new();

    tokio::spawn(async move {
        trace!(
            "Downloader task started with max_concurrent_downloads: {}",
            max_concurrent_downloads
        );
        loop {
            if scheduler.is_shutting_down() {
                trace!("Scheduler shutdown flag detected, exiting downloader task");
                break;
            }

            if res_tx.len() > max_concurrent_downloads * 2 {
                trace!("High response channel occupancy detected, applying backpressure");
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }

            let request = tokio::select! {
                result = req_rx.recv() => match result {
                    Ok(req) => req,
                    Err(_) => {
                        trace!("Request channel closed, exiting downloader task");
                        break;
                    }
                },
                _ = tokio::time::sleep(Duration::from_millis(100)) => continue,
            };

            state.in_flight_requests.fetch_add(1, Ordering::SeqCst);
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Download semaphore closed, dropping request {}", request.url);
                    state.in_flight_requests.fetch_sub(1, Ordering::SeqCst);
                    break;
                }
            };

            let downloader = Arc::clone(&downloader);
            let res_tx = res_tx.clone();
            let state = Arc::clone(&state);
            let stats = Arc::clone(&stats);

            tasks.spawn(async move {
                if let Some(response) = download(request, downloader.as_ref(), &stats).await {
                    trace!("Sending response for URL: {}", response.url);
                    // counted as parsing before it leaves the in-flight count
                    state.parsing_responses.fetch_add(1, Ordering::SeqCst);
                    if res_tx.send(response).await.is_err() {
                        error!("Response channel closed, cannot send downloaded response.");
                        state.parsing_responses.fetch_sub(1, Ordering::SeqCst);
                    }
                }
                state.in_flight_requests.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
            });

            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    error!("A download task failed: {:?}", e);
                }
            }
        }

        trace!("Waiting for active download tasks to complete");
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                error!("A download task failed: {:?}", e);
            }
        }
        trace!("Downloader task finished");
    })
}

/// Downloads one request. Failed downloads and non-2xx responses are counted
/// and dropped.
async fn download(
    request: Request,
    downloader: &dyn Downloader,
    stats: &StatCollector,
) -> Option<Response> {
    let url = request.url.clone();
    trace!("Downloading request for URL: {}", url);
    stats.increment_requests_sent();

    match downloader.download(request).await {
        Ok(response) => {
            stats.increment_responses_received();
            stats.record_response_status(response.status);
            stats.add_bytes_downloaded(response.body.len());
            if response.is_success() {
                stats.increment_requests_succeeded();
                Some(response)
            } else {
                debug!("Dropping {} response for URL: {}", response.status, url);
                stats.increment_requests_failed();
                None
            }
        }
        Err(e) => {
            error!("Download error for URL {}: {}", url, e);
            stats.increment_requests_failed();
            None
        }
    }
}
