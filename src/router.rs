//! # Router Module
//!
//! Classifies discovered links with an ordered rule table.
//!
//! ## Overview
//!
//! Each [`Rule`] pairs a url path pattern with a follow flag and an optional
//! [`Extractor`]. [`Router::route`] returns the **first** rule whose pattern matches;
//! rule order is part of the routing semantics, so a url matched by two rules is
//! always handled by the earlier one. A url matched by no rule is dropped.
//!
//! - `follow`: the links of the fetched page are routed in turn.
//! - `extractor`: the fetched page is turned into records.
//!
//! A rule with `follow` and no extractor only navigates (pagination pages).
//!
//! The router holds no mutable state and can be shared freely between parser workers.

use crate::error::SpiderError;
use crate::extract::{extract_brand, extract_product, extract_reviews, extract_user};
use crate::items::CosmeItem;
use regex::Regex;
use scraper::Html;
use tracing::trace;
use url::Url;

/// The entity extractor bound to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Product,
    Reviews,
    User,
    Brand,
}

impl Extractor {
    /// Runs the extractor over a fetched document.
    pub fn extract(&self, document: &Html, url: &Url) -> Result<Vec<CosmeItem>, SpiderError> {
        Ok(match self {
            Extractor::Product => vec![extract_product(document, url)?.into()],
            Extractor::Reviews => extract_reviews(document, url)?
                .into_iter()
                .map(CosmeItem::from)
                .collect(),
            Extractor::User => vec![extract_user(document, url)?.into()],
            Extractor::Brand => vec![extract_brand(document, url)?.into()],
        })
    }
}

/// One entry of the routing table.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    pub follow: bool,
    pub extractor: Option<Extractor>,
}

impl Rule {
    pub fn new(pattern: Regex, follow: bool, extractor: Option<Extractor>) -> Self {
        Self {
            pattern,
            follow,
            extractor,
        }
    }

    /// Compiles `pattern`, reporting invalid expressions as configuration errors.
    pub fn parse(pattern: &str, follow: bool, extractor: Option<Extractor>) -> Result<Self, SpiderError> {
        let pattern = Regex::new(pattern).map_err(|e| {
            SpiderError::ConfigurationError(format!("invalid rule pattern `{}`: {}", pattern, e))
        })?;
        Ok(Self::new(pattern, follow, extractor))
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Patterns are searched in the url path.
    pub fn matches(&self, url: &Url) -> bool {
        self.pattern.is_match(url.path())
    }
}

/// An ordered, first-match-wins rule table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: Vec<Rule>,
}

impl Router {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The cosme.net table. Review lists are reached through user pages.
    pub fn cosme() -> Self {
        let rule = |pattern: &str, extractor| {
            let pattern = Regex::new(pattern).expect("rule literal must be a valid regex");
            Rule::new(pattern, true, extractor)
        };
        Self::new(vec![
            // http://www.cosme.net/product/product_id/10084858/top
            rule(r"product/product_id/\d+/top", Some(Extractor::Product)),
            // http://www.cosme.net/product/product_id/10095736/beautists/page/1
            rule(r"product/product_id/\d+/beautists(/page/\d+)?$", None),
            // http://my.cosme.net/open_entry_reviewlist/list/user_id/1359201/dst/1
            rule(r"open_entry_reviewlist/list/user_id/\d+/dst/1$", Some(Extractor::Reviews)),
            // http://my.cosme.net/open/entry/reviewlist/list/page/2/srt/0/sad/0/dst/1/user_id/1016654
            rule(
                r"open/entry/reviewlist/list/page/\d+/srt/0/sad/0/dst/1/user_id/\d+",
                Some(Extractor::Reviews),
            ),
            // http://my.cosme.net/open_top/show/user_id/1359201
            rule(r"open_top/show/user_id/\d+$", Some(Extractor::User)),
            // http://www.cosme.net/brand/brand_id/493/top
            rule(r"brand/brand_id/\d+/top$", Some(Extractor::Brand)),
            // http://www.cosme.net/brand/brand_id/493/products/page-5
            rule(r"brand/brand_id/\d+/products(/page-\d+)?$", None),
        ])
    }

    /// Returns the index and rule of the first rule matching `url`.
    pub fn route(&self, url: &Url) -> Option<(usize, &Rule)> {
        let routed = self.rules.iter().enumerate().find(|(_, rule)| rule.matches(url));
        match routed {
            Some((index, rule)) => trace!("Routed {} to rule #{} `{}`", url, index, rule.pattern()),
            None => trace!("No rule matches {}", url),
        }
        routed
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
