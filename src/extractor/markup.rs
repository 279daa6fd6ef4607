//! Supplemental fields derived from the page markup
//!
//! The structured block lacks some data the listing cards show, such as the
//! room size. These helpers read it back from the HTML and correlate it with
//! decoded records through the listing id.

use crate::extractor::schema::ListingRecord;
use crate::IdParseError;
use regex::Regex;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static LISTING_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(\d+)\.html").expect("valid listing id pattern"));

// `m²` must end at a word boundary, with superscript digits counted as
// word characters
static AREA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+)\s?m²(?:[^\w¹²³]|$)").expect("valid area pattern")
});

const BOLD_TAGS: [&str; 2] = ["b", "strong"];

/// Extracts the numeric listing id from a listing url
///
/// The id is the run of digits immediately before the `.html` suffix.
///
/// # Example
///
/// ```
/// use wgwatch::extractor::derive_listing_id;
///
/// let id = derive_listing_id("https://www.wg-gesucht.de/wohnungen-und-haeuser-in-Berlin.123456.html");
/// assert_eq!(id, Ok(123456));
/// ```
pub fn derive_listing_id(url: &str) -> Result<u64, IdParseError> {
    LISTING_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
        .ok_or_else(|| IdParseError {
            url: url.to_string(),
        })
}

/// Finds the square meters of a listing in the page markup
///
/// Only elements whose `data-id` equals `listing_id` are searched. Bold
/// text within them, or the element itself when it is bold, is scanned for
/// an area such as `22 m²`.
pub fn derive_square_meters(content: &str, listing_id: u64) -> Option<u32> {
    let document = Html::parse_document(content);
    square_meters_in_document(&document, listing_id)
}

pub(crate) fn square_meters_in_document(document: &Html, listing_id: u64) -> Option<u32> {
    let anchor = Selector::parse(&format!(r#"[data-id="{}"]"#, listing_id)).ok()?;
    let bold = Selector::parse("b, strong").ok()?;

    document
        .select(&anchor)
        .flat_map(|card| {
            let own = BOLD_TAGS
                .contains(&card.value().name())
                .then_some(card);
            own.into_iter().chain(card.select(&bold))
        })
        .find_map(|tag: ElementRef<'_>| {
            let text = tag.text().collect::<String>();
            AREA_PATTERN
                .captures(text.trim())
                .and_then(|caps| caps[1].parse::<u32>().ok())
        })
}

/// Derives the last page index from the pagination control
///
/// The site labels its page links starting from 1 while page indices in
/// urls start from 0, so the last index is the highest label minus one.
/// Pages without pagination links have a single page, index 0.
pub fn derive_last_page(content: &str) -> u32 {
    let document = Html::parse_document(content);
    last_page_in_document(&document)
}

pub(crate) fn last_page_in_document(document: &Html) -> u32 {
    let Ok(links) = Selector::parse("#assets_list_pagination a.page-link") else {
        return 0;
    };

    document
        .select(&links)
        .filter_map(|link| link.text().collect::<String>().trim().parse::<u32>().ok())
        .max()
        .map(|label| label.saturating_sub(1))
        .unwrap_or(0)
}

/// Attaches square meters from the markup to each record
///
/// Records keep their order; records whose url has no listing id keep
/// `square_meters` unset.
pub fn merge_square_meters(records: Vec<ListingRecord>, content: &str) -> Vec<ListingRecord> {
    let document = Html::parse_document(content);
    merge_in_document(records, &document)
}

pub(crate) fn merge_in_document(
    records: Vec<ListingRecord>,
    document: &Html,
) -> Vec<ListingRecord> {
    records
        .into_iter()
        .map(|mut record| {
            if let Some(url) = &record.url {
                match derive_listing_id(url.as_str()) {
                    Ok(id) => record.square_meters = square_meters_in_document(document, id),
                    Err(e) => tracing::debug!("{}", e),
                }
            }
            record
        })
        .collect()
}
