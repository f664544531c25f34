//! # Pipeline Module
//!
//! Defines the `Pipeline` trait through which every scraped item passes.
//!
//! ## Overview
//!
//! Pipelines run in registration order. Each one may transform an item, pass it on
//! unchanged, or drop it by returning `Ok(None)`. A pipeline that holds resources
//! for the duration of a crawl acquires them in [`Pipeline::open`] and releases them
//! in [`Pipeline::close`]; the crawler calls `close` on every pipeline on every exit
//! path, including ctrl-c and fatal pipeline errors.
//!
//! Errors for which [`PipelineError::is_fatal`] is true stop the crawl.

use crate::error::PipelineError;
use crate::items::ScrapedItem;
use async_trait::async_trait;

#[async_trait]
pub trait Pipeline<I: ScrapedItem>: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Acquires resources before the first item arrives.
    async fn open(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Processes one item; `Ok(None)` drops it from the remaining pipelines.
    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError>;

    /// Releases resources. Called once at the end of the crawl.
    async fn close(&self) -> Result<(), PipelineError> {
        Ok(())
    }
}
