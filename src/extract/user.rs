//! User profile extraction (`/open_top/show/user_id/<id>`).

use super::selectors::user as sel;
use super::{exists, first_text, identity, label_mapped_counters, lookup, own_text};
use crate::coerce::coerce_int;
use crate::error::SpiderError;
use crate::items::User;
use scraper::{ElementRef, Html};
use url::Url;

const AGE_UNIT: char = '歳';
const COUNT_UNIT: char = '件';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Personal {
    Age,
    SkinType,
    HairType,
    HairVolume,
    Zodiac,
    BloodType,
}

const PERSONAL_FIELDS: &[(&str, Personal)] = &[
    ("年齢", Personal::Age),
    ("肌質", Personal::SkinType),
    ("髪質", Personal::HairType),
    ("髪量", Personal::HairVolume),
    ("星座", Personal::Zodiac),
    ("血液型", Personal::BloodType),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Qa,
    FavoriteUser,
    Fan,
}

const ACTIVITIES: &[(&str, Activity)] = &[
    ("chieco", Activity::Qa),
    ("お気入りﾒﾝﾊﾞｰ", Activity::FavoriteUser),
    ("Fan数", Activity::Fan),
];

/// Extracts a [`User`] from a profile page.
pub fn extract_user(document: &Html, url: &Url) -> Result<User, SpiderError> {
    let page = document.root_element();
    let mut user = User {
        user_id: identity(&sel::ID, url, "user")?,
        ..Default::default()
    };

    user.name = first_text(page, &sel::NAME);
    user.review_count = first_text(page, &sel::REVIEW_COUNT)
        .map(|count| coerce_int(&count.replace(COUNT_UNIT, "")));
    user.verified = exists(page, &sel::VERIFIED);

    for row in page.select(&sel::PERSONAL) {
        fill_personal(row, &mut user);
    }

    for (activity, value) in label_mapped_counters(page, &sel::ACTIVITY, &sel::ACTIVITY_NUM, ACTIVITIES) {
        match activity {
            Activity::Qa => user.qa_count = Some(value),
            Activity::FavoriteUser => user.favorite_user_count = Some(value),
            Activity::Fan => user.fan_count = Some(value),
        }
    }

    user.favorite_brand_count = first_text(page, &sel::FAVORITE_BRANDS)
        .and_then(|text| sel::DIGITS.find(&text).map(|m| coerce_int(m.as_str())));

    Ok(user)
}

/// A personal row is either `label value` as two text nodes, or a label text
/// node followed by a link holding the value.
fn fill_personal(row: ElementRef<'_>, user: &mut User) {
    let mut texts = own_text(row).map(str::trim).filter(|t| !t.is_empty());
    let Some(label) = texts.next() else {
        return;
    };
    let Some(field) = lookup(PERSONAL_FIELDS, label) else {
        return;
    };
    let value = match texts.next() {
        Some(value) => Some(value.to_string()),
        None => first_text(row, &sel::PERSONAL_LINK),
    };
    let Some(value) = value else {
        return;
    };

    match field {
        Personal::Age => user.age = Some(coerce_int(&value.replace(AGE_UNIT, ""))),
        Personal::SkinType => user.skin_type = Some(value),
        Personal::HairType => user.hair_type = Some(value),
        Personal::HairVolume => user.hair_volume = Some(value),
        Personal::Zodiac => user.zodiac = Some(value),
        Personal::BloodType => user.blood_type = Some(value),
    }
}
