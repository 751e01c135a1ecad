use std::borrow::Cow;

pub const LISTING_BASE_URL: &str =
    "https://www.fiverr.com/categories/programming-tech/buy/website-development";

/// Every listing on a page is one of these, a direct sibling in the results
/// container. A selector change on the site is an edit here and nowhere else.
pub const CARD_SELECTOR: &str = "div[class=basic-gig-card]";

pub const DEFAULT_OUTPUT_PATH: &str = "results.csv";

// the seller label and the price label carry fixed-length prefixes on the page
pub const NAME_PREFIX_CHARS: usize = 2;
pub const PRICE_PREFIX_CHARS: usize = 6;

lazy_static! {
    /// URL patterns handed to the browser when request filtering is enabled.
    pub static ref BLOCKED_URL_PATTERNS: Vec<String> = [
        "*googletagmanager.com*",
        "*google-analytics.com*",
        "*doubleclick.net*",
        "*googlesyndication.com*",
        "*adservice.google.*",
        "*facebook.net*",
        "*hotjar.com*",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect();
}

pub fn listing_page_url(category: &str, page: u32) -> String {
    let raw_ref = format!("website_type:{}", category);
    let site_ref: Cow<str> = urlencoding::encode(&raw_ref);
    format!(
        "{}/{}?source=pagination&ref={}&page={}",
        LISTING_BASE_URL, category, site_ref, page
    )
}

/// Drops a fixed number of leading characters and returns the remainder.
/// Label text shorter than the prefix yields an empty remainder.
pub fn trim_prefix_chars(text: &str, prefix_chars: usize) -> String {
    text.chars().skip(prefix_chars).collect()
}
