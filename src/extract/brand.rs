//! Brand page extraction (`/brand/brand_id/<id>/top`).

use super::selectors::brand as sel;
use super::{first_text, identity};
use crate::coerce::{Coerced, coerce_int};
use crate::error::SpiderError;
use crate::items::Brand;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Extracts a [`Brand`] from its top page.
pub fn extract_brand(document: &Html, url: &Url) -> Result<Brand, SpiderError> {
    let page = document.root_element();
    Ok(Brand {
        brand_id: identity(&sel::ID, url, "brand")?,
        name: first_text(page, &sel::NAME),
        maker: first_text(page, &sel::MAKER),
        product_count: count(page, &sel::PRODUCT_COUNT),
        review_count: count(page, &sel::REVIEW_COUNT),
        favorite_count: count(page, &sel::FAVORITE_COUNT),
    })
}

/// Counters read "123件" or "45人".
fn count(page: ElementRef<'_>, selector: &Selector) -> Option<Coerced> {
    first_text(page, selector).map(|text| coerce_int(&text.replace(['件', '人'], "")))
}
