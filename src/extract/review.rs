//! Review extraction.
//!
//! A review list page (`.../user_id/<id>...`) holds one `div.review-sec` per review;
//! every section becomes one [`Review`] for the user named in the url.

use super::selectors::review as sel;
use super::{
    all_text, capture_id, definition_list, exists, first_attr, first_descendant_text,
    first_text, identity, lookup, own_text, own_texts,
};
use crate::coerce::coerce_int;
use crate::error::SpiderError;
use crate::items::Review;
use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagField {
    PurchaseLocation,
    Effects,
    Colors,
    ProductTags,
    RelatedWords,
}

const TAG_FIELDS: &[(&str, TagField)] = &[
    ("購入場所", TagField::PurchaseLocation),
    ("効果", TagField::Effects),
    ("色", TagField::Colors),
    ("商品情報", TagField::ProductTags),
    ("関連ワード", TagField::RelatedWords),
];

/// Extracts every review on a review page.
///
/// `review_id` is only set when the url is a dedicated review page; a url that
/// names a review segment without a numeric id is rejected.
pub fn extract_reviews(document: &Html, url: &Url) -> Result<Vec<Review>, SpiderError> {
    let user_id = identity(&sel::USER_ID, url, "review")?;
    let review_id = match capture_id(&sel::REVIEW_ID, url.as_str()) {
        Some(id) => Some(id),
        None if url.path().contains("review_id/") => {
            return Err(SpiderError::RequiredField {
                kind: "review",
                field: "review_id",
                url: url.to_string(),
            });
        }
        None => None,
    };

    let page = document.root_element();
    let reviews = page
        .select(&sel::SECTION)
        .map(|section| {
            let mut review = Review {
                review_id,
                user_id,
                ..Default::default()
            };
            fill_review(page, section, &mut review);
            review
        })
        .collect();

    Ok(reviews)
}

fn fill_review(page: ElementRef<'_>, section: ElementRef<'_>, review: &mut Review) {
    if let Some(link) = first_attr(section, &sel::PRODUCT_LINK, "href") {
        review.product_id = capture_id(&sel::PRODUCT_ID, &link);
        if review.product_id.is_none() {
            debug!("Review product link without product id: {}", link);
        }
    }

    review.rating = first_text(section, &sel::RATING).map(|rating| coerce_int(&rating));
    review.date = review_date(page, section);
    review.text = all_text(section, &sel::TEXT);
    review.product_type = own_texts(section, &sel::PRODUCT_TYPE);

    for (term, details) in definition_list(section, &sel::TAG_LIST) {
        let Some(label) = own_text(term).map(str::trim).find(|t| !t.is_empty()) else {
            continue;
        };
        let Some(field) = lookup(TAG_FIELDS, label) else {
            continue;
        };
        let values = details.into_iter().filter_map(first_descendant_text).collect();
        match field {
            TagField::PurchaseLocation => review.purchase_location = values,
            TagField::Effects => review.effects = values,
            TagField::Colors => review.colors = values,
            TagField::ProductTags => review.product_tags = values,
            TagField::RelatedWords => review.related_words = values,
        }
    }
}

/// The compact date node wins when the section has one; otherwise the desktop
/// date of the section, then of the page.
fn review_date(page: ElementRef<'_>, section: ElementRef<'_>) -> Option<String> {
    if exists(section, &sel::MOBILE_DATE) {
        return first_text(section, &sel::MOBILE_DATE);
    }
    first_text(section, &sel::DATE).or_else(|| first_text(page, &sel::DATE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Coerced;

    const LIST_URL: &str = "http://my.cosme.net/open_entry_reviewlist/list/user_id/1359201/dst/1";

    fn review_page(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    const SECTION: &str = r##"
        <div class="review-sec">
          <p class="item"><a href="http://www.cosme.net/product/product_id/10084858/top">化粧水</a></p>
          <p class="reviewer-rating">6</p>
          <p class="mobile-date">2016/1/2</p>
          <p class="read">とても<span>良い</span><a href="#">
            続きを読む</a></p>
          <dl class="item-status"><dd><ul><li>購入品</li><li>リピート</li></ul></dd></dl>
          <div class="tag-list"><dl>
            <dt>効果</dt><dd><a>保湿</a></dd><dd><a>美白</a></dd>
            <dt>購入場所</dt>
            <dt>関連ワード</dt><dd><a>乾燥肌</a></dd>
            <dt>未知</dt><dd>x</dd>
          </dl></div>
        </div>"##;

    #[test]
    fn list_page_yields_one_review_per_section() {
        let page = review_page(&format!("{SECTION}{SECTION}"));
        let url = Url::parse(LIST_URL).unwrap();
        let reviews = extract_reviews(&page, &url).unwrap();

        assert_eq!(reviews.len(), 2);
        let review = &reviews[0];
        assert_eq!(review.user_id, 1359201);
        assert_eq!(review.review_id, None);
        assert_eq!(review.product_id, Some(10084858));
        assert_eq!(review.rating, Some(Coerced::Int(6)));
        assert_eq!(review.date.as_deref(), Some("2016/1/2"));
        assert_eq!(review.text, vec!["とても", "良い", "続きを読む"]);
        assert_eq!(review.product_type, vec!["購入品", "リピート"]);
        assert_eq!(review.effects, vec!["保湿", "美白"]);
        assert_eq!(review.related_words, vec!["乾燥肌"]);
        assert!(review.purchase_location.is_empty());
        assert!(review.colors.is_empty());
    }

    #[test]
    fn desktop_date_is_used_without_mobile_date() {
        let page = review_page(
            r#"<div class="review-sec"><p class="reviewer-rating">5</p></div>
               <p class="date">2015/12/24 10:00</p>"#,
        );
        let url = Url::parse(LIST_URL).unwrap();
        let reviews = extract_reviews(&page, &url).unwrap();
        assert_eq!(reviews[0].date.as_deref(), Some("2015/12/24 10:00"));
    }

    #[test]
    fn missing_fields_are_omitted() {
        let page = review_page(r#"<div class="review-sec"><p class="item"><a href="/shop">店</a></p></div>"#);
        let url = Url::parse(LIST_URL).unwrap();
        let review = extract_reviews(&page, &url).unwrap().remove(0);
        assert_eq!(
            review,
            Review {
                user_id: 1359201,
                ..Default::default()
            }
        );
    }

    #[test]
    fn dedicated_review_page_carries_review_id() {
        let page = review_page(SECTION);
        let url = Url::parse("http://my.cosme.net/open_entry_review/user_id/42/review_id/987").unwrap();
        let reviews = extract_reviews(&page, &url).unwrap();
        assert_eq!(reviews[0].review_id, Some(987));
        assert_eq!(reviews[0].user_id, 42);

        let url = Url::parse("http://my.cosme.net/open_entry_review/user_id/42/review_id/new").unwrap();
        let err = extract_reviews(&page, &url).unwrap_err();
        assert!(matches!(err, SpiderError::RequiredField { field: "review_id", .. }));
    }

    #[test]
    fn url_without_user_is_rejected() {
        let page = review_page(SECTION);
        let url = Url::parse("http://my.cosme.net/open_entry_reviewlist/list/dst/1").unwrap();
        assert!(extract_reviews(&page, &url).unwrap_err().is_page_level());
    }
}
