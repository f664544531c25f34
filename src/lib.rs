//! # cosme-spider
//!
//! A rule-routed crawler for cosme.net that harvests four kinds of records
//! (products, reviews, users and brands) into one JSON Lines stream per type.
//!
//! Pages are fetched by a [`Downloader`], routed by URL through the ordered
//! rule table of a [`Router`], and handed to the entity extractor bound to the
//! matching rule. Extracted records flow through the item [`Pipeline`]s; the
//! default [`MultiJsonLinesPipeline`] appends each one as a compact UTF-8 line
//! to `<type>.jsonl`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cosme_spider::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SpiderError> {
//!     tracing_subscriber::fmt::init();
//!
//!     let crawler = CrawlerBuilder::new(CosmeSpider::new())
//!         .downloader(ReqwestDownloader::new(DownloaderConfig::default()))
//!         .add_pipeline(MultiJsonLinesPipeline::new("./corpus"))
//!         .build()?;
//!     let stats = crawler.get_stats();
//!
//!     crawler.start_crawl().await?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod coerce;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod exporter;
pub mod extract;
pub mod items;
pub mod pipeline;
pub mod prelude;
pub mod request;
pub mod response;
pub mod router;
pub mod scheduler;
pub mod spider;
pub mod state;
pub mod stats;
pub mod tag_list;

pub use builder::{CrawlerBuilder, CrawlerConfig};
pub use crawler::Crawler;
pub use downloader::{Downloader, DownloaderConfig, ReqwestDownloader};
pub use error::{PipelineError, SpiderError};
pub use exporter::MultiJsonLinesPipeline;
pub use items::{Brand, Color, CosmeItem, ItemType, Product, Review, ScrapedItem, User};
pub use pipeline::Pipeline;
pub use request::Request;
pub use response::Response;
pub use router::{Extractor, Router, Rule};
pub use scheduler::Scheduler;
pub use spider::{CosmeSpider, ParseOutput, Spider};
pub use stats::StatCollector;

pub use async_trait::async_trait;
pub use tokio;
