//! Locating and decoding the structured listing block

use crate::extractor::schema::{CollectionPage, ListingRecord};
use crate::ExtractionError;
use scraper::{Html, Selector};
use serde_json::Value;

/// Substring that identifies the listing payload among the page's scripts
pub const LISTING_SENTINEL: &str = r#"@type": "Product","#;

const COLLECTION_TYPE: &str = "CollectionPage";

/// Finds the structured listing block in raw page content
///
/// Scans every `<script>` element for the listing sentinel. The matching
/// payload is trimmed of anything trailing its closing bracket and the
/// `"@type"` keys are rewritten to `"type"` so the schema can decode them.
///
/// # Errors
///
/// `ExtractionError::NoStructuredBlock` if no script contains the sentinel.
pub fn locate_structured_block(content: &str) -> Result<String, ExtractionError> {
    let document = Html::parse_document(content);
    locate_in_document(&document)
}

pub(crate) fn locate_in_document(document: &Html) -> Result<String, ExtractionError> {
    let selector = Selector::parse("script").map_err(|_| ExtractionError::NoStructuredBlock)?;

    document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .find(|text| text.contains(LISTING_SENTINEL))
        .map(|text| normalize_block(&text))
        .ok_or(ExtractionError::NoStructuredBlock)
}

/// Strips the trailing artifact and the `@` of the type discriminator key
fn normalize_block(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c != ']' && c != '}')
        .replace("\"@type\"", "\"type\"")
}

/// Decodes a normalized block into listing records
///
/// The records are returned in `position` order. Square meters are left
/// unset; see [`merge_square_meters`](crate::extractor::merge_square_meters).
///
/// # Errors
///
/// * `ExtractionError::Decode` - the block is not valid JSON or a listing
///   does not match the schema
/// * `ExtractionError::MissingCollection` - the block has no `CollectionPage`
pub fn decode_listings(block: &str) -> Result<Vec<ListingRecord>, ExtractionError> {
    let entries = match serde_json::from_str::<Value>(block)? {
        Value::Array(entries) => entries,
        single => vec![single],
    };

    let collection = entries
        .into_iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some(COLLECTION_TYPE))
        .ok_or(ExtractionError::MissingCollection)?;

    let collection: CollectionPage = serde_json::from_value(collection)?;

    let mut items = collection.main_entity.item_list_element;
    items.sort_by_key(|item| item.position);

    Ok(items
        .into_iter()
        .map(|item| ListingRecord::from(item.item))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_script(script: &str) -> String {
        format!(
            r#"<html><head>
            <script type="text/javascript">var tracking = {{}};</script>
            <script type="application/ld+json">{}</script>
            </head><body></body></html>"#,
            script
        )
    }

    const BLOCK: &str = r#"[
        {"@context": "https://schema.org", "@type": "Organization", "name": "WG-Gesucht"},
        {"@type": "CollectionPage", "name": "WG-Zimmer", "mainEntity": {
            "@type": "ItemList", "numberOfItems": 2, "itemListElement": [
                {"@type": "ListItem", "position": 2, "item": {
                    "@type": "Product", "name": "Zimmer in Kreuzberg",
                    "url": "https://www.wg-gesucht.de/wg-zimmer-in-Berlin-Kreuzberg.222.html",
                    "offers": {"@type": "Offer", "price": 640, "priceCurrency": "EUR"}
                }},
                {"@type": "ListItem", "position": 1, "item": {
                    "@type": "Product", "name": "Helles Zimmer",
                    "url": "https://www.wg-gesucht.de/wg-zimmer-in-Berlin-Mitte.111.html",
                    "description": "Schoenes Zimmer", "datePosted": "2024-05-01",
                    "offers": {"@type": "Offer", "price": "550", "priceCurrency": "EUR",
                               "availability": "https://schema.org/InStock"},
                    "provider": {"@type": "Person", "name": "Anna"},
                    "mainEntity": {"@type": "Accommodation", "address": {
                        "@type": "PostalAddress", "streetAddress": "Torstr. 1",
                        "addressLocality": "Berlin", "postalCode": "10119",
                        "addressRegion": "Berlin", "addressCountry": "DE"}},
                    "image": "https://img.wg-gesucht.de/111.jpg"
                }}
            ]}}
    ];"#;

    #[test]
    fn test_locate_block_finds_sentinel_script() {
        let block = locate_structured_block(&page_with_script(BLOCK)).unwrap();
        assert!(block.starts_with('['));
        assert!(block.ends_with(']'));
        assert!(!block.contains("@type"));
        assert!(block.contains(r#""type": "CollectionPage""#));
    }

    #[test]
    fn test_locate_block_missing() {
        let html = page_with_script(r#"{"@type": "Organization"}"#);
        let result = locate_structured_block(&html);
        assert!(matches!(result, Err(ExtractionError::NoStructuredBlock)));
    }

    #[test]
    fn test_locate_block_in_empty_page() {
        let result = locate_structured_block("");
        assert!(matches!(result, Err(ExtractionError::NoStructuredBlock)));
    }

    #[test]
    fn test_normalize_strips_trailing_artifact() {
        assert_eq!(normalize_block("  [1, 2];\n"), "[1, 2]");
        assert_eq!(normalize_block("{\"@type\": \"x\"},"), "{\"type\": \"x\"}");
        assert_eq!(normalize_block("[1]"), "[1]");
    }

    #[test]
    fn test_decode_orders_by_position() {
        let block = locate_structured_block(&page_with_script(BLOCK)).unwrap();
        let records = decode_listings(&block).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("Helles Zimmer"));
        assert_eq!(records[1].name.as_deref(), Some("Zimmer in Kreuzberg"));
    }

    #[test]
    fn test_decode_maps_nested_fields() {
        let block = locate_structured_block(&page_with_script(BLOCK)).unwrap();
        let records = decode_listings(&block).unwrap();
        let first = &records[0];

        assert_eq!(first.offer.price, Some(550.0));
        assert_eq!(first.offer.price_currency.as_deref(), Some("EUR"));
        assert_eq!(first.offer.offer_type.as_deref(), Some("Offer"));
        assert_eq!(
            first.offer.availability.as_ref().map(|u| u.as_str()),
            Some("https://schema.org/InStock")
        );
        assert_eq!(first.provider_name.as_deref(), Some("Anna"));
        assert_eq!(first.date_posted.as_deref(), Some("2024-05-01"));

        let address = first.address.as_ref().unwrap();
        assert_eq!(address.street_address.as_deref(), Some("Torstr. 1"));
        assert_eq!(address.postal_code.as_deref(), Some("10119"));
        assert_eq!(address.address_country.as_deref(), Some("DE"));
        assert!(first.image.is_some());
        assert_eq!(first.square_meters, None);
    }

    #[test]
    fn test_decode_leaves_absent_fields_empty() {
        let block = locate_structured_block(&page_with_script(BLOCK)).unwrap();
        let records = decode_listings(&block).unwrap();
        let second = &records[1];

        assert_eq!(second.description, None);
        assert_eq!(second.provider_name, None);
        assert_eq!(second.address, None);
        assert_eq!(second.image, None);
        assert_eq!(second.offer.availability, None);
    }

    #[test]
    fn test_decode_missing_collection() {
        let result = decode_listings(r#"[{"type": "Organization"}]"#);
        assert!(matches!(result, Err(ExtractionError::MissingCollection)));
    }

    #[test]
    fn test_decode_invalid_json() {
        let result = decode_listings("[{not json");
        assert!(matches!(result, Err(ExtractionError::Decode(_))));
    }

    #[test]
    fn test_decode_fails_closed_on_schema_violation() {
        // Listing without its required offer
        let block = r#"[{"type": "CollectionPage", "mainEntity": {"itemListElement": [
            {"position": 1, "item": {"name": "No offer"}}
        ]}}]"#;
        let result = decode_listings(block);
        assert!(matches!(result, Err(ExtractionError::Decode(_))));
    }

    #[test]
    fn test_decode_empty_item_list() {
        let block = r#"[{"type": "CollectionPage", "mainEntity": {"itemListElement": []}}]"#;
        assert!(decode_listings(block).unwrap().is_empty());
    }
}
