//! # Builder Module
//!
//! Provides the `CrawlerBuilder`, a fluent API for assembling a `Crawler` from a
//! spider, a downloader and a chain of item pipelines.
//!
//! Anything left unset gets a default: a [`ReqwestDownloader`] with the
//! one-second politeness delay, and a [`MultiJsonLinesPipeline`] writing one
//! `<type>.jsonl` stream per entity type into the current directory.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cosme_spider::prelude::*;
//!
//! async fn crawl() -> Result<(), SpiderError> {
//!     let crawler = CrawlerBuilder::new(CosmeSpider::new())
//!         .max_concurrent_downloads(4)
//!         .add_pipeline(MultiJsonLinesPipeline::new("./out"))
//!         .build()?;
//!
//!     crawler.start_crawl().await
//! }
//! ```

use crate::crawler::Crawler;
use crate::downloader::{Downloader, ReqwestDownloader};
use crate::error::SpiderError;
use crate::exporter::MultiJsonLinesPipeline;
use crate::pipeline::Pipeline;
use crate::scheduler::Scheduler;
use crate::spider::Spider;
use crate::stats::StatCollector;
use std::sync::Arc;
use tracing::debug;

/// Configuration for the crawler's concurrency settings.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// The maximum number of concurrent downloads.
    pub max_concurrent_downloads: usize,
    /// The number of workers dedicated to parsing responses.
    pub parser_workers: usize,
    /// The maximum number of concurrent item processing pipelines.
    pub max_concurrent_pipelines: usize,
    /// The capacity of communication channels between components.
    pub channel_capacity: usize,
    /// Requests the scheduler will hold before refusing new ones.
    pub max_pending_requests: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            max_concurrent_downloads: num_cpus::get().max(16),
            parser_workers: num_cpus::get().clamp(4, 16),
            max_concurrent_pipelines: num_cpus::get().min(8),
            channel_capacity: 1000,
            max_pending_requests: 100_000,
        }
    }
}

impl CrawlerConfig {
    fn validate(&self) -> Result<(), SpiderError> {
        let settings = [
            ("max_concurrent_downloads", self.max_concurrent_downloads),
            ("parser_workers", self.parser_workers),
            ("max_concurrent_pipelines", self.max_concurrent_pipelines),
            ("channel_capacity", self.channel_capacity),
            ("max_pending_requests", self.max_pending_requests),
        ];
        match settings.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(SpiderError::ConfigurationError(format!(
                "{} must be greater than 0.",
                name
            ))),
            None => Ok(()),
        }
    }
}

pub struct CrawlerBuilder<S: Spider> {
    crawler_config: CrawlerConfig,
    downloader: Option<Arc<dyn Downloader>>,
    spider: S,
    item_pipelines: Vec<Box<dyn Pipeline<S::Item>>>,
}

impl<S: Spider> CrawlerBuilder<S> {
    /// Creates a new `CrawlerBuilder` for a given spider.
    pub fn new(spider: S) -> Self {
        Self {
            crawler_config: CrawlerConfig::default(),
            downloader: None,
            spider,
            item_pipelines: Vec::new(),
        }
    }

    /// Replaces the whole concurrency configuration.
    pub fn config(mut self, config: CrawlerConfig) -> Self {
        self.crawler_config = config;
        self
    }

    /// Sets the maximum number of concurrent downloads.
    pub fn max_concurrent_downloads(mut self, limit: usize) -> Self {
        self.crawler_config.max_concurrent_downloads = limit;
        self
    }

    /// Sets the maximum number of concurrent parser workers.
    pub fn max_parser_workers(mut self, limit: usize) -> Self {
        self.crawler_config.parser_workers = limit;
        self
    }

    /// Sets the maximum number of concurrent pipelines.
    pub fn max_concurrent_pipelines(mut self, limit: usize) -> Self {
        self.crawler_config.max_concurrent_pipelines = limit;
        self
    }

    /// Sets the capacity of communication channels between components.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.crawler_config.channel_capacity = capacity;
        self
    }

    pub fn max_pending_requests(mut self, limit: usize) -> Self {
        self.crawler_config.max_pending_requests = limit;
        self
    }

    /// Sets a custom downloader for the crawler.
    pub fn downloader<D: Downloader>(mut self, downloader: D) -> Self {
        self.downloader = Some(Arc::new(downloader));
        self
    }

    /// Adds an item pipeline. Pipelines run in the order they are added.
    pub fn add_pipeline<P>(mut self, pipeline: P) -> Self
    where
        P: Pipeline<S::Item>,
    {
        self.item_pipelines.push(Box::new(pipeline));
        self
    }

    /// Builds the `Crawler`, filling in the default downloader and pipeline.
    pub fn build(mut self) -> Result<Crawler<S>, SpiderError> {
        self.crawler_config.validate()?;

        if self.item_pipelines.is_empty() {
            debug!("No pipeline configured, exporting to the current directory");
            self = self.add_pipeline(MultiJsonLinesPipeline::new("."));
        }

        let downloader: Arc<dyn Downloader> = match self.downloader {
            Some(downloader) => downloader,
            None => Arc::new(ReqwestDownloader::default()),
        };
        let config = self.crawler_config;
        let (scheduler, req_rx) = Scheduler::new(config.max_pending_requests);

        Ok(Crawler::new(
            scheduler,
            req_rx,
            downloader,
            self.spider,
            Arc::new(self.item_pipelines),
            config.max_concurrent_downloads,
            config.parser_workers,
            config.max_concurrent_pipelines,
            config.channel_capacity,
            Arc::new(StatCollector::new()),
        ))
    }
}
