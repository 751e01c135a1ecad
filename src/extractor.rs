//! Field extraction for one listing card.
//!
//! Every read crosses into the page as a small JS call with `this` bound to
//! the card node and a plain string (or null) coming back; no live handles
//! cross the boundary. Missing sub-elements resolve to null inside the page,
//! so only a dead card handle surfaces as an error, and that skips just the
//! one card upstream.

use headless_chrome::Element;

use crate::types::{CrawlerError, ListingRecord};
use crate::utils::{trim_prefix_chars, NAME_PREFIX_CHARS, PRICE_PREFIX_CHARS};

// the card keeps its fields at fixed child offsets: 0 = link + thumbnail,
// 2 = seller row, 3 = title, 4 = rating block, 5 = price label
const PICTURE_JS: &str = r#"function() {
    var holder = this.children[0];
    var img = holder ? holder.querySelector("img") : null;
    return img ? img.src : null;
}"#;

const LINK_JS: &str = r#"function() {
    var anchor = this.children[0];
    return anchor && anchor.href ? anchor.href : null;
}"#;

const NAME_JS: &str = r#"function() {
    var row = this.children[2];
    var seller = row ? row.children[0] : null;
    return seller ? seller.innerText : null;
}"#;

const TITLE_JS: &str = r#"function() {
    var title = this.children[3];
    return title ? title.innerText : null;
}"#;

const RATING_SCORE_JS: &str = r#"function() {
    var block = this.children[4];
    var score = block ? block.querySelector(".rating-score") : null;
    return score ? score.innerText : null;
}"#;

const RATING_COUNT_JS: &str = r#"function() {
    var block = this.children[4];
    var count = block ? block.querySelector(".ratings-count") : null;
    return count ? count.innerText : null;
}"#;

const PRICE_JS: &str = r#"function() {
    var price = this.children[5];
    return price ? price.innerText : null;
}"#;

/// Field values as they come back from the page, before trimming.
#[derive(Debug, Default, Clone)]
struct RawCard {
    picture: Option<String>,
    link: Option<String>,
    name: Option<String>,
    title: Option<String>,
    rating_score: Option<String>,
    rating_count: Option<String>,
    price: Option<String>,
}

/// Returns exactly one record for the card. Fields are read independently,
/// so a missing sub-element empties that field and nothing else.
pub fn extract_record(
    card: &Element<'_>,
    page: u32,
    index: usize,
) -> Result<ListingRecord, CrawlerError> {
    let raw = RawCard {
        picture: text_field(card, PICTURE_JS, page, index)?,
        link: text_field(card, LINK_JS, page, index)?,
        name: text_field(card, NAME_JS, page, index)?,
        title: text_field(card, TITLE_JS, page, index)?,
        rating_score: text_field(card, RATING_SCORE_JS, page, index)?,
        rating_count: text_field(card, RATING_COUNT_JS, page, index)?,
        price: text_field(card, PRICE_JS, page, index)?,
    };
    Ok(assemble(raw, page, index))
}

fn text_field(
    card: &Element<'_>,
    js_fn: &str,
    page: u32,
    index: usize,
) -> Result<Option<String>, CrawlerError> {
    let object = card
        .call_js_fn(js_fn, vec![], false)
        .map_err(|e| CrawlerError::StaleCard {
            page,
            index,
            reason: e.to_string(),
        })?;
    Ok(match object.value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

fn assemble(raw: RawCard, page: u32, index: usize) -> ListingRecord {
    if raw.rating_score.is_some() != raw.rating_count.is_some() {
        debug!(
            "page {} card {}: rating sub-elements disagree (score: {}, count: {})",
            page,
            index,
            raw.rating_score.is_some(),
            raw.rating_count.is_some()
        );
    }

    ListingRecord {
        picture: required(raw.picture, "picture", page, index),
        link: required(raw.link, "link", page, index),
        name: trim_prefix_chars(&required(raw.name, "name", page, index), NAME_PREFIX_CHARS),
        title: required(raw.title, "title", page, index),
        rating_score: raw.rating_score,
        rating_count: raw.rating_count,
        price: raw.price.map(|p| trim_prefix_chars(&p, PRICE_PREFIX_CHARS)),
    }
}

fn required(value: Option<String>, field: &str, page: u32, index: usize) -> String {
    match value {
        Some(text) => text,
        None => {
            debug!("page {} card {}: {} sub-element missing", page, index, field);
            String::new()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn full_raw() -> RawCard {
        RawCard {
            picture: Some("https://img.example/1.webp".into()),
            link: Some("https://listings.example/gig/1".into()),
            name: Some("XXJohn Doe".into()),
            title: Some("I will build a portfolio website".into()),
            rating_score: Some("4.9".into()),
            rating_count: Some("(312)".into()),
            price: Some("From $45".into()),
        }
    }

    #[test]
    fn assembles_a_complete_card() {
        let record = assemble(full_raw(), 1, 0);
        assert_eq!(record.picture, "https://img.example/1.webp");
        assert_eq!(record.link, "https://listings.example/gig/1");
        assert_eq!(record.name, "John Doe");
        assert_eq!(record.title, "I will build a portfolio website");
        assert_eq!(record.rating_score.as_deref(), Some("4.9"));
        assert_eq!(record.rating_count.as_deref(), Some("(312)"));
        assert_eq!(record.price.as_deref(), Some("45"));
    }

    #[test]
    fn every_card_yields_exactly_one_record_even_when_empty() {
        let record = assemble(RawCard::default(), 7, 3);
        assert_eq!(record.picture, "");
        assert_eq!(record.link, "");
        assert_eq!(record.name, "");
        assert_eq!(record.title, "");
        assert_eq!(record.rating_score, None);
        assert_eq!(record.rating_count, None);
        assert_eq!(record.price, None);
    }

    #[test]
    fn one_missing_field_does_not_drop_the_others() {
        let mut raw = full_raw();
        raw.picture = None;
        let record = assemble(raw, 2, 4);
        assert_eq!(record.picture, "");
        assert_eq!(record.link, "https://listings.example/gig/1");
        assert_eq!(record.title, "I will build a portfolio website");
    }

    #[test]
    fn rating_fields_stay_a_pair() {
        let mut raw = full_raw();
        raw.rating_score = None;
        raw.rating_count = None;
        let record = assemble(raw, 1, 1);
        assert!(record.rating_score.is_none() && record.rating_count.is_none());

        let record = assemble(full_raw(), 1, 2);
        assert!(record.rating_score.is_some() && record.rating_count.is_some());
    }

    #[test]
    fn short_labels_trim_to_empty_rather_than_failing() {
        let mut raw = full_raw();
        raw.name = Some("X".into());
        raw.price = Some("From".into());
        let record = assemble(raw, 3, 0);
        assert_eq!(record.name, "");
        assert_eq!(record.price.as_deref(), Some(""));
    }

    #[test]
    fn a_ratingless_card_in_the_middle_keeps_all_three_records() {
        let mut ratingless = full_raw();
        ratingless.rating_score = None;
        ratingless.rating_count = None;

        let raws = vec![full_raw(), ratingless, full_raw()];
        let records: Vec<ListingRecord> = raws
            .into_iter()
            .enumerate()
            .map(|(index, raw)| assemble(raw, 1, index))
            .collect();

        assert_eq!(records.len(), 3);
        assert!(records[1].rating_score.is_none() && records[1].rating_count.is_none());
        assert!(records[0].rating_score.is_some() && records[2].rating_score.is_some());
    }
}
