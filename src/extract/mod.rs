//! # Extract Module
//!
//! Turns fetched documents into typed records.
//!
//! ## Overview
//!
//! Each entity has a pure extractor `(document, source url) -> record`:
//! [`product::extract_product`], [`review::extract_reviews`],
//! [`user::extract_user`] and [`brand::extract_brand`]. They share the field
//! access helpers defined here:
//!
//! - **Scalar fields** take the first non-empty text node of the matched elements.
//! - **List fields** collect every non-empty, trimmed text fragment in order.
//! - **Label-mapped counters** scan sibling containers for a known label and read
//!   the number next to it.
//! - **Definition lists** are regrouped with [`crate::tag_list::group_tag_nodes`].
//!
//! Field access is fail-soft: a missing node omits the field. Only the identity,
//! parsed from the source url, is required; when it is missing the extractor
//! returns [`SpiderError::IdentityParse`] and no record is produced for the page.

pub mod brand;
pub mod product;
pub mod review;
pub mod selectors;
pub mod user;

pub use brand::extract_brand;
pub use product::extract_product;
pub use review::extract_reviews;
pub use user::extract_user;

use crate::coerce::{Coerced, coerce_int};
use crate::error::SpiderError;
use crate::tag_list::{TagNode, group_tag_nodes};
use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

/// Direct text children of `element`, untrimmed.
pub fn own_text<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    element
        .children()
        .filter_map(|node| node.value().as_text().map(|text| &**text))
}

/// First non-empty direct text node among the elements matched by `selector`.
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .flat_map(|element| own_text(element))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Non-empty direct text nodes of every matched element, in document order.
pub fn own_texts(scope: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    scope
        .select(selector)
        .flat_map(|element| own_text(element))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every non-empty text fragment below the matched elements, in document order.
pub fn all_text(scope: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    scope
        .select(selector)
        .flat_map(|element| element.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// All text fragments of `element` joined by single spaces.
pub fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty text node in the subtree of `element`.
pub fn first_descendant_text(element: ElementRef<'_>) -> Option<String> {
    element
        .text()
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .find_map(|element| element.value().attr(attr))
        .map(str::to_string)
}

pub fn exists(scope: ElementRef<'_>, selector: &Selector) -> bool {
    scope.select(selector).next().is_some()
}

/// Exact-match lookup in a fixed label table.
pub fn lookup<F: Copy>(table: &[(&str, F)], label: &str) -> Option<F> {
    table
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, field)| *field)
}

/// Scans the containers matched by `container` for known labels.
///
/// A container whose text includes a label yields that label's field together with
/// the integer-coerced text of its `count` node. Containers without a count are
/// skipped.
pub fn label_mapped_counters<F: Copy>(
    scope: ElementRef<'_>,
    container: &Selector,
    count: &Selector,
    table: &[(&str, F)],
) -> Vec<(F, Coerced)> {
    let mut counters = Vec::new();
    for element in scope.select(container) {
        let text = joined_text(element);
        for (label, field) in table {
            if !text.contains(label) {
                continue;
            }
            if let Some(value) = first_text(element, count) {
                counters.push((*field, coerce_int(&value)));
            }
        }
    }
    counters
}

/// Regroups the `<dt>`/`<dd>` elements matched by `selector` into term → details pairs.
pub fn definition_list<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
) -> Vec<(ElementRef<'a>, Vec<ElementRef<'a>>)> {
    let nodes = scope
        .select(selector)
        .filter_map(|element| match element.value().name() {
            "dt" => Some(TagNode::Term(element)),
            "dd" => Some(TagNode::Detail(element)),
            _ => None,
        });
    group_tag_nodes(nodes)
}

/// First capture of `pattern` in `text` as an integer.
pub fn capture_id(pattern: &Regex, text: &str) -> Option<u64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parses the identity of a `kind` record from its page url.
pub fn identity(pattern: &Regex, url: &Url, kind: &'static str) -> Result<u64, SpiderError> {
    capture_id(pattern, url.as_str()).ok_or_else(|| SpiderError::IdentityParse {
        kind,
        url: url.to_string(),
    })
}
