//! CSS selectors and URL patterns for cosme.net pages.
//!
//! Every selector the extractors depend on lives here. When the site changes its
//! markup the affected fields silently disappear from the output, so this is the
//! file to update after capturing a fresh page sample.

use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("selector literal must be valid CSS")
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("pattern literal must be a valid regex")
}

/// Links discovered on any followed page.
pub static LINK: LazyLock<Selector> = LazyLock::new(|| css("a[href]"));

pub mod product {
    use super::*;

    pub static ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"product/product_id/(\d+)/top"));

    pub static NAME: LazyLock<Selector> =
        LazyLock::new(|| css("h2.item-name > .pdct-name > a"));
    pub static MAKER: LazyLock<Selector> = LazyLock::new(|| css("dl.maker > dd > a"));
    pub static BRAND: LazyLock<Selector> = LazyLock::new(|| css("dl.brand-name > dd > a"));
    pub static DESCRIPTION: LazyLock<Selector> =
        LazyLock::new(|| css("dl.item-description > dd"));
    pub static CATEGORY: LazyLock<Selector> =
        LazyLock::new(|| css("dl.item-category > dd > span"));

    /// Microdata rating, e.g. `<p itemprop="ratingValue">4.3</p>`.
    pub static RATING: LazyLock<Selector> = LazyLock::new(|| css("p[itemprop='ratingValue']"));
    pub static POINT: LazyLock<Selector> = LazyLock::new(|| css("p.point"));
    pub static REVIEW_COUNT: LazyLock<Selector> =
        LazyLock::new(|| css("ul.select-top li.review > a > span.num"));

    /// Rows of the rating box: ranking, volume and price, sale date.
    pub static INFO_ROW: LazyLock<Selector> =
        LazyLock::new(|| css("div.rating > ul.info-rating > li"));
    pub static INFO_TITLE: LazyLock<Selector> = LazyLock::new(|| css(".info-ttl"));
    pub static INFO_DESC: LazyLock<Selector> = LazyLock::new(|| css(".info-desc"));
    pub static INFO_RANK: LazyLock<Selector> = LazyLock::new(|| css(".info-ranking > span"));
    pub static INFO_CATEGORY: LazyLock<Selector> = LazyLock::new(|| css(".info-ctg > a"));

    /// Like / Have buttons.
    pub static COUNTER: LazyLock<Selector> =
        LazyLock::new(|| css("div.info-related > ul.rev-btn > li"));
    pub static COUNTER_NUM: LazyLock<Selector> = LazyLock::new(|| css("span.num"));

    pub static COLOR: LazyLock<Selector> = LazyLock::new(|| css(".color-ptn > dd ul > li"));
    pub static COLOR_NAME: LazyLock<Selector> = LazyLock::new(|| css(".color-txt"));
    pub static COLOR_IMG: LazyLock<Selector> = LazyLock::new(|| css("img[src]"));
    pub static COLOR_LINK: LazyLock<Selector> = LazyLock::new(|| css("a[href]"));
}

pub mod review {
    use super::*;

    pub static USER_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"user_id/(\d+)"));
    pub static REVIEW_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"review_id/(\d+)"));
    pub static PRODUCT_ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"product_id/(\d+)"));

    pub static SECTION: LazyLock<Selector> = LazyLock::new(|| css("div.review-sec"));
    pub static PRODUCT_LINK: LazyLock<Selector> = LazyLock::new(|| css("p.item > a[href]"));
    pub static RATING: LazyLock<Selector> = LazyLock::new(|| css("p.reviewer-rating"));
    pub static MOBILE_DATE: LazyLock<Selector> = LazyLock::new(|| css("p.mobile-date"));
    pub static DATE: LazyLock<Selector> = LazyLock::new(|| css("p.date"));
    pub static TEXT: LazyLock<Selector> = LazyLock::new(|| css("p.read"));
    pub static PRODUCT_TYPE: LazyLock<Selector> =
        LazyLock::new(|| css("dl.item-status > dd > ul > li"));
    pub static TAG_LIST: LazyLock<Selector> =
        LazyLock::new(|| css("div.tag-list > dl > dt, div.tag-list > dl > dd"));
}

pub mod user {
    use super::*;

    pub static ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"user_id/(\d+)"));
    pub static DIGITS: LazyLock<Regex> = LazyLock::new(|| pattern(r"\d+"));

    pub static NAME: LazyLock<Selector> = LazyLock::new(|| css("p.name > span"));
    pub static REVIEW_COUNT: LazyLock<Selector> =
        LazyLock::new(|| css("div#new-review > h3 > span.number"));
    pub static VERIFIED: LazyLock<Selector> = LazyLock::new(|| css("span.ico-cmn-auth"));
    pub static PERSONAL: LazyLock<Selector> = LazyLock::new(|| css("ul.personal > li"));
    pub static PERSONAL_LINK: LazyLock<Selector> = LazyLock::new(|| css("a"));
    pub static ACTIVITY: LazyLock<Selector> = LazyLock::new(|| css("ul.activities > li"));
    pub static ACTIVITY_NUM: LazyLock<Selector> = LazyLock::new(|| css("span"));
    pub static FAVORITE_BRANDS: LazyLock<Selector> =
        LazyLock::new(|| css("div#brand > p.view-more > a"));
}

pub mod brand {
    use super::*;

    pub static ID: LazyLock<Regex> = LazyLock::new(|| pattern(r"brand/brand_id/(\d+)/top"));

    pub static NAME: LazyLock<Selector> = LazyLock::new(|| css("div.title01 > h2"));
    pub static MAKER: LazyLock<Selector> = LazyLock::new(|| css("dd.maker > a"));
    pub static PRODUCT_COUNT: LazyLock<Selector> =
        LazyLock::new(|| css("dt.productNumber + dd > a"));
    pub static REVIEW_COUNT: LazyLock<Selector> =
        LazyLock::new(|| css("dt.reviewNumber + dd > a"));
    pub static FAVORITE_COUNT: LazyLock<Selector> =
        LazyLock::new(|| css("dt.clipNumber + dd > a"));
}
