//! # Crawler Module
//!
//! The crawl engine that moves requests, responses and items between the
//! scheduler, the downloader, the spider and the pipelines.
//!
//! ## Overview
//!
//! Each stage runs in its own Tokio task and stages talk over kanal channels:
//!
//! ```text
//! Scheduler --requests--> downloader task --responses--> parser task --items--> item processor
//!     ^                                                       |
//!     +-------------------- discovered requests --------------+
//! ```
//!
//! - **Downloader task**: fetches requests with bounded concurrency; non-2xx
//!   responses and failed downloads are counted and dropped.
//! - **Parser task**: a coordinator feeding a fixed pool of workers that run
//!   `Spider::parse` and route its output.
//! - **Item processor**: runs every item through the pipelines in order and
//!   reports fatal pipeline errors.
//!
//! [`Crawler::start_crawl`] ends on idle, ctrl-c, or a fatal pipeline error, and
//! always closes the pipelines before returning.

mod core;
mod item_processor;
mod request_handler;
mod response_parser;

pub use core::Crawler;
pub(crate) use item_processor::spawn_item_processor_task;
pub(crate) use request_handler::spawn_downloader_task;
pub(crate) use response_parser::spawn_parser_task;
