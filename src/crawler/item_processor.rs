//! Contains the item processor functionality for the crawler.
//! Items run through the configured pipelines in order, up to
//! `max_concurrent_pipelines` items at a time. A fatal pipeline error is handed
//! to the crawler state, which ends the crawl.

use crate::items::ScrapedItem;
use crate::pipeline::Pipeline;
use crate::state::CrawlerState;
use crate::stats::StatCollector;
use kanal::AsyncReceiver;
use log::{debug, error, trace, warn};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub type SharedPipelines<I> = Arc<Vec<Box<dyn Pipeline<I>>>>;

pub fn spawn_item_processor_task<I>(
    state: Arc<CrawlerState>,
    item_rx: AsyncReceiver<I>,
    pipelines: SharedPipelines<I>,
    max_concurrent_pipelines: usize,
    stats: Arc<StatCollector>,
) -> tokio::task::JoinHandle<()>
where
    I: ScrapedItem,
{
    let mut tasks = JoinSet::new();
    let semaphore = Arc::new(Semaphore::new(max_concurrent_pipelines));

    trace!(
        "Starting item processor with max_concurrent_pipelines: {}",
        max_concurrent_pipelines
    );
    tokio::spawn(async move {
        while let Ok(item) = item_rx.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    warn!("Semaphore closed, shutting down item processor actor.");
                    state.processing_items.fetch_sub(1, Ordering::SeqCst);
                    break;
                }
            };

            let state = Arc::clone(&state);
            let pipelines = Arc::clone(&pipelines);
            let stats = Arc::clone(&stats);

            tasks.spawn(async move {
                run_pipelines(item, &pipelines, &state, &stats).await;
                state.processing_items.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
            });

            while let Some(finished) = tasks.try_join_next() {
                if let Err(e) = finished {
                    error!("An item processing task failed: {:?}", e);
                }
            }
        }

        trace!("Waiting for active item processing tasks to complete");
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                error!("An item processing task failed: {:?}", e);
            }
        }
        trace!("Item processor finished");
    })
}

/// Passes one item through every pipeline until one drops it or fails.
async fn run_pipelines<I: ScrapedItem>(
    item: I,
    pipelines: &[Box<dyn Pipeline<I>>],
    state: &CrawlerState,
    stats: &StatCollector,
) {
    let mut current = item;
    for pipeline in pipelines {
        match pipeline.process_item(current).await {
            Ok(Some(next)) => current = next,
            Ok(None) => {
                debug!("Pipeline '{}' dropped item", pipeline.name());
                stats.increment_items_dropped_by_pipeline();
                return;
            }
            Err(e) if e.is_fatal() => {
                error!("Pipeline '{}' failed fatally: {}", pipeline.name(), e);
                stats.increment_items_dropped_by_pipeline();
                state.report_fatal(e);
                return;
            }
            Err(e) => {
                warn!("Pipeline '{}' error: {}", pipeline.name(), e);
                stats.increment_items_dropped_by_pipeline();
                return;
            }
        }
    }
    trace!("Item successfully processed by all pipelines");
    stats.increment_items_exported();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::items::{CosmeItem, User};
    use async_trait::async_trait;

    struct DropUsers;

    #[async_trait]
    impl Pipeline<CosmeItem> for DropUsers {
        fn name(&self) -> &str {
            "DropUsers"
        }

        async fn process_item(&self, item: CosmeItem) -> Result<Option<CosmeItem>, PipelineError> {
            Ok((item.item_type() != "user").then_some(item))
        }
    }

    struct Broken;

    #[async_trait]
    impl Pipeline<CosmeItem> for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        async fn process_item(&self, _item: CosmeItem) -> Result<Option<CosmeItem>, PipelineError> {
            Err(PipelineError::StreamClosed("user".into()))
        }
    }

    fn user() -> CosmeItem {
        CosmeItem::from(User {
            user_id: 1,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn dropped_items_skip_later_pipelines() {
        let state = CrawlerState::new();
        let stats = StatCollector::new();
        let pipelines: Vec<Box<dyn Pipeline<CosmeItem>>> = vec![Box::new(DropUsers), Box::new(Broken)];

        run_pipelines(user(), &pipelines, &state, &stats).await;
        assert_eq!(stats.items_dropped_by_pipeline.load(Ordering::SeqCst), 1);
        assert!(!state.has_fatal());
    }

    #[tokio::test]
    async fn fatal_errors_reach_the_crawler_state() {
        let state = CrawlerState::new();
        let stats = StatCollector::new();
        let pipelines: Vec<Box<dyn Pipeline<CosmeItem>>> = vec![Box::new(Broken)];

        run_pipelines(user(), &pipelines, &state, &stats).await;
        assert!(state.has_fatal());
        assert_eq!(stats.items_exported.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn processor_task_drains_the_channel() {
        let state = CrawlerState::new();
        let stats = Arc::new(StatCollector::new());
        let (item_tx, item_rx) = kanal::unbounded_async::<CosmeItem>();
        let pipelines: SharedPipelines<CosmeItem> = Arc::new(vec![Box::new(DropUsers)]);

        let handle = spawn_item_processor_task(
            Arc::clone(&state),
            item_rx,
            pipelines,
            2,
            Arc::clone(&stats),
        );
        for _ in 0..3 {
            state.processing_items.fetch_add(1, Ordering::SeqCst);
            item_tx.send(user()).await.unwrap();
        }
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while !state.is_idle() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(stats.items_dropped_by_pipeline.load(Ordering::SeqCst), 3);

        drop(item_tx);
        handle.await.unwrap();
    }
}
