//! Typed schema for the embedded JSON-LD listing payload
//!
//! The payload is a JSON array of schema.org objects. Only the
//! `CollectionPage` entry matters; everything else is ignored. Optional
//! fields may be absent or `null`, but a present field of the wrong shape
//! fails the decode.

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Postal address of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub street_address: Option<String>,
    pub address_locality: Option<String>,
    pub address_region: Option<String>,
    pub postal_code: Option<String>,
    pub address_country: Option<String>,
}

/// Offer details of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(rename = "type")]
    pub offer_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    pub price_currency: Option<String>,
    pub availability: Option<Url>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Provider {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MainEntity {
    pub address: Option<PostalAddress>,
}

/// A single listing as it appears in the payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScrapedListing {
    pub name: Option<String>,
    pub url: Option<Url>,
    pub description: Option<String>,
    pub date_posted: Option<String>,
    pub offers: Offer,
    pub provider: Option<Provider>,
    pub main_entity: Option<MainEntity>,
    pub image: Option<Url>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListItem {
    pub position: i64,
    pub item: ScrapedListing,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemList {
    pub item_list_element: Vec<ListItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionPage {
    pub main_entity: ItemList,
}

/// One listing ready to be persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingRecord {
    pub name: Option<String>,
    pub url: Option<Url>,
    pub description: Option<String>,
    pub date_posted: Option<String>,
    pub offer: Offer,
    pub provider_name: Option<String>,
    pub address: Option<PostalAddress>,
    pub image: Option<Url>,
    pub square_meters: Option<u32>,
}

impl From<ScrapedListing> for ListingRecord {
    fn from(listing: ScrapedListing) -> Self {
        Self {
            name: listing.name,
            url: listing.url,
            description: listing.description,
            date_posted: listing.date_posted,
            offer: listing.offers,
            provider_name: listing.provider.and_then(|p| p.name),
            address: listing.main_entity.and_then(|m| m.address),
            image: listing.image,
            square_meters: None,
        }
    }
}

/// Accepts prices given either as JSON numbers or as numeric strings
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Number(f64),
        Text(String),
    }

    match Option::<Price>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Price::Number(value)) => Ok(Some(value)),
        Some(Price::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid price: {text:?}"))),
    }
}
