//! A "prelude" for users of the `cosme-spider` crate.
//!
//! Re-exports the traits and types needed to configure and run a crawl, or to
//! plug in a custom downloader or pipeline.
//!
//! # Example
//!
//! ```
//! use cosme_spider::prelude::*;
//! ```

pub use crate::{
    // Engine
    Crawler,
    CrawlerBuilder,
    CrawlerConfig,
    StatCollector,
    // Traits
    Downloader,
    Pipeline,
    ScrapedItem,
    Spider,
    // Cosme crawl
    CosmeItem,
    CosmeSpider,
    DownloaderConfig,
    MultiJsonLinesPipeline,
    ReqwestDownloader,
    Router,
    // Plumbing for trait implementations
    ParseOutput,
    PipelineError,
    Request,
    Response,
    SpiderError,
    async_trait,
};
