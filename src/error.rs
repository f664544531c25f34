//! # Error Module
//!
//! Error types shared by the crawl engine, the extractors and the item pipelines.
//!
//! Errors are grouped by how far they propagate:
//!
//! - **Field level**: never an error. A missing node omits the field and a failed
//!   numeric parse keeps the original text (see [`crate::coerce`]).
//! - **Page level**: [`SpiderError::IdentityParse`] and [`SpiderError::RequiredField`]
//!   abort the records of one page. The parser logs them and the crawl goes on.
//! - **Crawl level**: fatal [`PipelineError`]s (an output stream that cannot be
//!   written) stop the crawl after every stream has been flushed and closed.

use std::io;
use thiserror::Error;

/// Errors raised while crawling or extracting.
#[derive(Debug, Error)]
pub enum SpiderError {
    /// The identity segment of a page URL did not match its positional pattern.
    #[error("cannot parse {kind} identity from url {url}")]
    IdentityParse { kind: &'static str, url: String },

    /// A field read with must-exist access was not present.
    #[error("required field `{field}` of {kind} missing on {url}")]
    RequiredField {
        kind: &'static str,
        field: &'static str,
        url: String,
    },

    #[error("download of {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl SpiderError {
    /// Returns true when the error only invalidates the records of the current page.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            SpiderError::IdentityParse { .. } | SpiderError::RequiredField { .. }
        )
    }
}

/// Errors raised by item pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An output stream could not be appended to or flushed.
    #[error("cannot write to stream `{stream}`: {source}")]
    StreamWrite {
        stream: String,
        #[source]
        source: io::Error,
    },

    /// A record arrived for a stream that is not open.
    #[error("stream `{0}` is not open")]
    StreamClosed(String),

    #[error("cannot serialize item: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("item error: {0}")]
    ItemError(String),
}

impl PipelineError {
    /// Fatal errors terminate the crawl; the rest drop a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::StreamWrite { .. } | PipelineError::StreamClosed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_level_errors_are_distinguishable() {
        let err = SpiderError::IdentityParse {
            kind: "product",
            url: "http://www.cosme.net/product/product_id/abc/top".into(),
        };
        assert!(err.is_page_level());
        assert!(err.to_string().contains("product"));

        let err = SpiderError::ConfigurationError("bad".into());
        assert!(!err.is_page_level());
    }

    #[test]
    fn stream_failures_are_fatal() {
        let err = PipelineError::StreamWrite {
            stream: "review".into(),
            source: io::Error::other("disk full"),
        };
        assert!(err.is_fatal());
        assert!(PipelineError::StreamClosed("user".into()).is_fatal());
        assert!(!PipelineError::ItemError("skip".into()).is_fatal());
    }
}
