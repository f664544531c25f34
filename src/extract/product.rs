//! Product page extraction (`/product/product_id/<id>/top`).

use super::selectors::product as sel;
use super::{
    all_text, first_attr, first_text, identity, joined_text, label_mapped_counters, lookup,
};
use crate::coerce::{Coerced, coerce_float, coerce_int};
use crate::error::SpiderError;
use crate::items::{Color, Product};
use scraper::{ElementRef, Html};
use url::Url;

/// Separator between volume and price in the "容量・本体価格" row.
const VOLUME_PRICE_SEPARATOR: char = '・';
/// Currency unit marking a lone value as a price.
const CURRENCY_UNIT: char = '円';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfoRow {
    Ranking,
    VolumePrice,
    SaleDate,
}

const INFO_ROWS: &[(&str, InfoRow)] = &[
    ("ランキング", InfoRow::Ranking),
    ("容量・本体価格", InfoRow::VolumePrice),
    ("発売日", InfoRow::SaleDate),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counter {
    Like,
    Have,
}

const COUNTERS: &[(&str, Counter)] = &[("Like", Counter::Like), ("Have", Counter::Have)];

/// Extracts a [`Product`] from its top page.
pub fn extract_product(document: &Html, url: &Url) -> Result<Product, SpiderError> {
    let page = document.root_element();
    let mut product = Product {
        product_id: identity(&sel::ID, url, "product")?,
        ..Default::default()
    };

    product.name = first_text(page, &sel::NAME);
    product.maker = first_text(page, &sel::MAKER);
    product.brand = first_text(page, &sel::BRAND);
    product.description = all_text(page, &sel::DESCRIPTION);
    product.categories = page
        .select(&sel::CATEGORY)
        .map(joined_text)
        .filter(|category| !category.is_empty())
        .collect();

    product.rating = first_text(page, &sel::RATING).map(|rating| coerce_float(&rating));
    product.point = first_text(page, &sel::POINT).map(|point| coerce_float(&point.replace("pt", "")));
    product.review_count = first_text(page, &sel::REVIEW_COUNT)
        .map(|count| coerce_int(&count.replace(['(', ')'], "")));

    fill_info_rows(page, &mut product);

    for (counter, value) in label_mapped_counters(page, &sel::COUNTER, &sel::COUNTER_NUM, COUNTERS) {
        match counter {
            Counter::Like => product.like_count = Some(value),
            Counter::Have => product.have_count = Some(value),
        }
    }

    product.colors = page
        .select(&sel::COLOR)
        .map(|swatch| Color {
            name: first_text(swatch, &sel::COLOR_NAME),
            img_link: first_attr(swatch, &sel::COLOR_IMG, "src"),
            link: first_attr(swatch, &sel::COLOR_LINK, "href"),
        })
        .collect();

    Ok(product)
}

fn fill_info_rows(page: ElementRef<'_>, product: &mut Product) {
    for row in page.select(&sel::INFO_ROW) {
        let Some(title) = first_text(row, &sel::INFO_TITLE) else {
            continue;
        };
        let Some(kind) = lookup(INFO_ROWS, &title) else {
            continue;
        };

        match kind {
            InfoRow::Ranking => {
                let mut ranking = Vec::new();
                if let Some(rank) = first_text(row, &sel::INFO_RANK) {
                    ranking.push(coerce_int(&rank));
                }
                if let Some(category) = first_text(row, &sel::INFO_CATEGORY) {
                    ranking.push(Coerced::Text(category));
                }
                product.ranking = ranking;
            }
            InfoRow::VolumePrice => {
                if let Some(value) = first_text(row, &sel::INFO_DESC) {
                    let (volume, price) = split_volume_price(&value);
                    product.volume = volume;
                    product.price = price;
                }
            }
            InfoRow::SaleDate => product.sale_date = first_text(row, &sel::INFO_DESC),
        }
    }
}

/// Splits a combined "volume・price" value.
///
/// Without a separator the lone value is a price when it carries the currency
/// unit, otherwise a volume.
pub fn split_volume_price(value: &str) -> (Option<String>, Option<String>) {
    fn non_empty(part: &str) -> Option<String> {
        let part = part.trim();
        (!part.is_empty()).then(|| part.to_string())
    }

    if value.contains(VOLUME_PRICE_SEPARATOR) {
        let mut parts = value.split(VOLUME_PRICE_SEPARATOR);
        let volume = parts.next().and_then(non_empty);
        let price = parts.next().and_then(non_empty);
        (volume, price)
    } else if value.contains(CURRENCY_UNIT) {
        (None, non_empty(value))
    } else {
        (non_empty(value), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_URL: &str = "http://www.cosme.net/product/product_id/10084858/top";

    fn product_page(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn composite_value_splits_on_separator() {
        assert_eq!(
            split_volume_price("300ml・1200円"),
            (Some("300ml".into()), Some("1200円".into()))
        );
        assert_eq!(
            split_volume_price("300 ml・1200円"),
            (Some("300 ml".into()), Some("1200円".into()))
        );
    }

    #[test]
    fn lone_value_is_classified_by_currency() {
        assert_eq!(split_volume_price("1200円"), (None, Some("1200円".into())));
        assert_eq!(split_volume_price("300ml"), (Some("300ml".into()), None));
    }

    #[test]
    fn minimal_page_yields_identity_and_present_fields() {
        let page = product_page(
            r#"<dl class="maker"><dd><a href="/maker/1">Acme Corp</a></dd></dl>
               <p itemprop="ratingValue">4.29999999999</p>
               <div class="info-related"><ul class="rev-btn">
                 <li><a>Like</a> <span class="num">85</span></li>
               </ul></div>"#,
        );
        let url = Url::parse(PRODUCT_URL).unwrap();
        let product = extract_product(&page, &url).unwrap();

        assert_eq!(product.product_id, 10084858);
        assert_eq!(product.maker.as_deref(), Some("Acme Corp"));
        assert_eq!(product.rating, Some(Coerced::Float(4.29999999999)));
        assert_eq!(product.like_count, Some(Coerced::Int(85)));
        assert_eq!(product.have_count, None);
        assert_eq!(product.name, None);
        assert!(product.ranking.is_empty());
    }

    #[test]
    fn full_page_populates_every_field() {
        let page = product_page(
            r##"<h2 class="item-name"><span class="pdct-name"><a href="#">モイスチャーミルク</a></span></h2>
               <dl class="maker"><dd><a>資生堂</a></dd></dl>
               <dl class="brand-name"><dd><a>エリクシール</a></dd></dl>
               <dl class="item-description"><dd>しっとり<br>うるおう</dd></dl>
               <dl class="item-category"><dd>
                 <span><a>スキンケア</a> &gt; <a>乳液</a></span>
                 <span><a>ボディケア</a></span>
               </dd></dl>
               <p itemprop="ratingValue">5.2</p>
               <p class="point">5.4pt</p>
               <ul class="select-top"><li class="review"><a><span class="num">(1234)</span></a></li></ul>
               <div class="rating"><ul class="info-rating">
                 <li><span class="info-ttl">ランキング</span>
                     <span class="info-ranking"><span>3</span></span>
                     <span class="info-ctg"><a>乳液</a></span></li>
                 <li><span class="info-ttl">容量・本体価格</span><span class="info-desc">130ml・3,000円</span></li>
                 <li><span class="info-ttl">発売日</span><span class="info-desc">2015/8/21</span></li>
                 <li><span class="info-ttl">その他</span><span class="info-desc">ignored</span></li>
               </ul></div>
               <div class="info-related"><ul class="rev-btn">
                 <li>Like <span class="num">10</span></li>
                 <li>Have <span class="num">20</span></li>
               </ul></div>
               <dl class="color-ptn"><dd><ul>
                 <li><a href="/c/1"><img src="/img/1.jpg"></a><span class="color-txt">ピンク</span></li>
                 <li><span class="color-txt">ベージュ</span></li>
                 <li></li>
               </ul></dd></dl>"##,
        );
        let url = Url::parse(PRODUCT_URL).unwrap();
        let product = extract_product(&page, &url).unwrap();

        assert_eq!(product.name.as_deref(), Some("モイスチャーミルク"));
        assert_eq!(product.maker.as_deref(), Some("資生堂"));
        assert_eq!(product.brand.as_deref(), Some("エリクシール"));
        assert_eq!(product.description, vec!["しっとり", "うるおう"]);
        assert_eq!(product.categories, vec!["スキンケア > 乳液", "ボディケア"]);
        assert_eq!(product.rating, Some(Coerced::Float(5.2)));
        assert_eq!(product.point, Some(Coerced::Float(5.4)));
        assert_eq!(product.review_count, Some(Coerced::Int(1234)));
        assert_eq!(
            product.ranking,
            vec![Coerced::Int(3), Coerced::Text("乳液".into())]
        );
        assert_eq!(product.volume.as_deref(), Some("130ml"));
        assert_eq!(product.price.as_deref(), Some("3,000円"));
        assert_eq!(product.sale_date.as_deref(), Some("2015/8/21"));
        assert_eq!(product.like_count, Some(Coerced::Int(10)));
        assert_eq!(product.have_count, Some(Coerced::Int(20)));
        // swatches keep their position even when nothing could be read
        assert_eq!(product.colors.len(), 3);
        assert_eq!(product.colors[2], Color::default());
        assert_eq!(product.colors[0].img_link.as_deref(), Some("/img/1.jpg"));
        assert_eq!(product.colors[0].link.as_deref(), Some("/c/1"));
        assert_eq!(product.colors[1].name.as_deref(), Some("ベージュ"));
        assert_eq!(product.colors[1].link, None);
    }

    #[test]
    fn ranking_without_category_keeps_rank_only() {
        let page = product_page(
            r#"<div class="rating"><ul class="info-rating">
                 <li><span class="info-ttl">ランキング</span><span class="info-ranking"><span>7</span></span></li>
               </ul></div>"#,
        );
        let url = Url::parse(PRODUCT_URL).unwrap();
        let product = extract_product(&page, &url).unwrap();
        assert_eq!(product.ranking, vec![Coerced::Int(7)]);
    }

    #[test]
    fn unparseable_identity_is_fatal() {
        let page = product_page("<p itemprop='ratingValue'>4.0</p>");
        let url = Url::parse("http://www.cosme.net/product/product_id/10084858/reviews").unwrap();
        let err = extract_product(&page, &url).unwrap_err();
        assert!(matches!(err, SpiderError::IdentityParse { kind: "product", .. }));
    }
}
