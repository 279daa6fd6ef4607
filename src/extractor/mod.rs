//! Extractor for listing pages
//!
//! Pure parsing, no I/O. Turns the raw content of one listing page into the
//! ordered listing records it contains plus the index of the city's last
//! page.
//!
//! - `structured`: locating and decoding the embedded JSON-LD block
//! - `markup`: fields read back from the HTML (listing ids, sizes, pagination)
//! - `schema`: serde types for the payload and the resulting records

mod markup;
mod schema;
mod structured;

pub use markup::{derive_last_page, derive_listing_id, derive_square_meters, merge_square_meters};
pub use schema::{ListingRecord, Offer, PostalAddress};
pub use structured::{decode_listings, locate_structured_block, LISTING_SENTINEL};

use crate::ExtractionError;
use scraper::Html;

/// Case-insensitive marker of an access-challenge page
pub const CHALLENGE_MARKER: &str = "g-recaptcha";

/// Everything extracted from one listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// Listings in page order, square meters merged in
    pub listings: Vec<ListingRecord>,

    /// Index of the city's last page as reported by the pagination control
    pub last_page: u32,
}

/// Returns true if the content is an access-challenge page
pub fn is_challenge_page(content: &str) -> bool {
    content.to_lowercase().contains(CHALLENGE_MARKER)
}

/// Extracts listings and pagination from one page
///
/// The content is parsed once and shared by all extraction steps.
///
/// # Errors
///
/// Fails if the page has no structured listing block or the block does not
/// decode. A page whose pagination control is missing is not an error.
pub fn extract_page(content: &str) -> Result<ExtractedPage, ExtractionError> {
    let document = Html::parse_document(content);

    let block = structured::locate_in_document(&document)?;
    let listings = decode_listings(&block)?;
    let listings = markup::merge_in_document(listings, &document);
    let last_page = markup::last_page_in_document(&document);

    Ok(ExtractedPage {
        listings,
        last_page,
    })
}
