//! A unit of work for the frontier.

use url::Url;

/// A url admitted to the frontier, tagged with the routing rule that admitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    /// Index into the spider's rule table; `None` for start urls.
    pub rule: Option<usize>,
}

impl Request {
    pub fn new(url: Url) -> Self {
        Self { url, rule: None }
    }

    pub fn with_rule(mut self, rule: usize) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Normalized url used for duplicate detection. Fragments never reach the server,
    /// so two urls differing only by fragment are the same page.
    pub fn fingerprint(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.into()
    }
}
