//! A fetched page handed over by the [`Downloader`](crate::downloader::Downloader).

use crate::request::Request;
use bytes::Bytes;
use scraper::Html;
use std::borrow::Cow;
use url::Url;

#[derive(Debug, Clone)]
pub struct Response {
    /// Final url after redirects.
    pub url: Url,
    pub status: u16,
    pub body: Bytes,
    /// The request this response answers.
    pub request: Request,
}

impl Response {
    pub fn new(request: Request, status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            url: request.url.clone(),
            status,
            body: body.into(),
            request,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parses the body into a queryable document tree.
    pub fn to_html(&self) -> Html {
        Html::parse_document(&self.text())
    }
}
