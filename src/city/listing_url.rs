use crate::city::City;

/// Default site root for listing urls
pub const DEFAULT_BASE_URL: &str = "https://www.wg-gesucht.de";

/// Listing categories 0-3 (rooms, flats, apartments, houses), offers only
const FILTER_QUERY: &str = "offer_filter=1&city_id={city_id}&sort_order=0&noDeact=1\
&categories%5B%5D=0&categories%5B%5D=1&categories%5B%5D=2&categories%5B%5D=3\
&pagination=4&pu=";

/// Builds the listing url for one page of one city
///
/// # Arguments
///
/// * `base_url` - Site root, with or without a trailing slash
/// * `city` - The city to list
/// * `page` - Zero-based page index
///
/// # Example
///
/// ```
/// use wgwatch::city::{listing_url, City, DEFAULT_BASE_URL};
///
/// let url = listing_url(DEFAULT_BASE_URL, City::Berlin, 2);
/// assert!(url.contains("-in-Berlin.8.0+1+2+3.1.2.html"));
/// ```
pub fn listing_url(base_url: &str, city: City, page: u32) -> String {
    let city_id = city.site_id();
    format!(
        "{}/wg-zimmer-und-1-zimmer-wohnungen-und-wohnungen-und-haeuser-in-{}.{}.0+1+2+3.1.{}.html?{}",
        base_url.trim_end_matches('/'),
        city.display_name(),
        city_id,
        page,
        FILTER_QUERY.replace("{city_id}", &city_id.to_string())
    )
}
