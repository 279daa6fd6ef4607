//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing pages and run whole fleets
//! over the HTTP session into an in-memory database.

use std::sync::{Arc, Mutex};
use wgwatch::config::Config;
use wgwatch::crawler::{CityScheduler, FleetSettings, HttpLauncher};
use wgwatch::storage::{SqliteSink, SqliteStorage, Storage};
use wgwatch::City;
use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a listing page; pagination reports `last_page` as the final index
fn listing_page(city: City, page: u32, listings: usize, last_page: u32) -> String {
    let items: Vec<String> = (0..listings)
        .map(|i| {
            let id = 1000 * (page as usize + 1) + i;
            format!(
                r#"{{"@type": "ListItem", "position": {pos}, "item": {{"@type": "Product",
                    "name": "{city} {page}/{i}",
                    "url": "https://www.wg-gesucht.de/wg-zimmer-in-{city}.{id}.html",
                    "datePosted": "2024-05-01",
                    "offers": {{"@type": "Offer", "price": {price}, "priceCurrency": "EUR"}},
                    "mainEntity": {{"@type": "Accommodation", "address": {{"@type": "PostalAddress",
                        "addressLocality": "{city}", "postalCode": "10115"}}}}}}}}"#,
                pos = i + 1,
                price = 400 + i * 10,
            )
        })
        .collect();

    let labels: String = (1..=last_page + 1)
        .map(|n| format!(r##"<li><a class="page-link" href="#">{n}</a></li>"##))
        .collect();

    format!(
        r#"<html><head><script type="application/ld+json">[
            {{"@type": "WebSite", "name": "WG-Gesucht"}},
            {{"@type": "CollectionPage", "mainEntity": {{"@type": "ItemList", "itemListElement": [{items}]}}}}
        ]
        </script></head><body>
            <div class="offer_list_item" data-id="{first}"><span><b>19 m² | 400 €</b></span></div>
            <ul id="assets_list_pagination">{labels}</ul>
        </body></html>"#,
        items = items.join(","),
        first = 1000 * (page as usize + 1),
    )
}

const CHALLENGE: &str = r#"<html><body><form><div class="g-recaptcha" data-sitekey="x"></div></form></body></html>"#;

/// Matches the listing url of one city page
fn page_route(city: City, page: u32) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path_regex(format!(
            r"-in-{}\.{}\.0\+1\+2\+3\.1\.{}\.html$",
            city.display_name(),
            city.site_id(),
            page
        )))
        .and(query_param("city_id", city.site_id().to_string()))
}

async fn serve_city(server: &MockServer, city: City, pages: u32, listings: usize) {
    for page in 0..pages {
        page_route(city, page)
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(listing_page(city, page, listings, pages - 1)),
            )
            .mount(server)
            .await;
    }
}

/// Creates a test configuration pointing at the mock server with no delays
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.timing.settle_delay_ms = 0;
    config.timing.captcha_poll_ms = 5;
    config.timing.captcha_settle_ms = 0;
    config.timing.inter_page_delay_ms = 0;
    config.retry.backoff_secs = 0;
    config.session.request_timeout_secs = 5;
    config
}

fn storage_with_run() -> (Arc<Mutex<SqliteStorage>>, Arc<SqliteSink>) {
    let mut storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let run_id = storage.create_run("integration").unwrap();
    let storage = Arc::new(Mutex::new(storage));
    let sink = Arc::new(SqliteSink::new(storage.clone(), run_id));
    (storage, sink)
}

async fn run(config: &Config, sink: Arc<SqliteSink>, cities: Vec<City>) -> wgwatch::crawler::FleetSummary {
    let launcher = HttpLauncher::new(&config.session).expect("Failed to build HTTP client");
    CityScheduler::new(launcher, sink, FleetSettings::from_config(config))
        .run_fleet(cities)
        .await
}

#[tokio::test]
async fn test_full_crawl_two_cities() {
    let server = MockServer::start().await;
    serve_city(&server, City::Berlin, 3, 4).await;
    serve_city(&server, City::Koeln, 2, 2).await;

    let config = create_test_config(&server.uri());
    let (storage, sink) = storage_with_run();

    let summary = run(&config, sink, vec![City::Berlin, City::Koeln]).await;

    assert!(summary.is_complete());
    assert_eq!(summary.completed.len(), 2);

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_listings().unwrap(), 3 * 4 + 2 * 2);
    assert_eq!(
        storage.count_pages_by_city().unwrap(),
        vec![("Berlin".to_string(), 3), ("Koeln".to_string(), 2)]
    );

    let first_page = storage.get_listings_for_page(City::Berlin, 0).unwrap();
    assert_eq!(first_page.len(), 4);
    assert_eq!(first_page[0].name.as_deref(), Some("Berlin 0/0"));
    assert_eq!(first_page[0].square_meters, Some(19));
    assert_eq!(first_page[1].square_meters, None);
    assert_eq!(first_page[1].price, Some(410.0));
}

#[tokio::test]
async fn test_page_budget_limits_crawl() {
    let server = MockServer::start().await;
    serve_city(&server, City::Hamburg, 10, 1).await;

    let mut config = create_test_config(&server.uri());
    config.scraper.max_pages_to_scrape = 3;
    let (storage, sink) = storage_with_run();

    run(&config, sink, vec![City::Hamburg]).await;

    let storage = storage.lock().unwrap();
    assert_eq!(
        storage.count_pages_by_city().unwrap(),
        vec![("Hamburg".to_string(), 3)]
    );
    assert!(storage.get_listings_for_page(City::Hamburg, 3).unwrap().is_empty());
}

#[tokio::test]
async fn test_challenge_clears_before_extraction() {
    let server = MockServer::start().await;

    // Mounted first, so it answers until exhausted
    page_route(City::Leipzig, 0)
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    serve_city(&server, City::Leipzig, 1, 3).await;

    let config = create_test_config(&server.uri());
    let (storage, sink) = storage_with_run();

    let summary = run(&config, sink, vec![City::Leipzig]).await;

    assert_eq!(summary.completed, vec![City::Leipzig]);
    assert_eq!(storage.lock().unwrap().count_listings().unwrap(), 3);
}

#[tokio::test]
async fn test_server_error_resumes_at_failed_page() {
    let server = MockServer::start().await;

    page_route(City::Stuttgart, 1)
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    serve_city(&server, City::Stuttgart, 3, 2).await;

    let config = create_test_config(&server.uri());
    let (storage, sink) = storage_with_run();

    let summary = run(&config, sink, vec![City::Stuttgart]).await;

    assert_eq!(summary.completed, vec![City::Stuttgart]);
    let storage = storage.lock().unwrap();
    // Every page persisted exactly once
    for page in 0..3 {
        assert_eq!(storage.get_listings_for_page(City::Stuttgart, page).unwrap().len(), 2);
    }
    assert_eq!(storage.count_listings().unwrap(), 6);
}

#[tokio::test]
async fn test_persistent_failure_abandons_city() {
    let server = MockServer::start().await;
    serve_city(&server, City::Dortmund, 2, 1).await;
    page_route(City::Bremen, 0)
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.retry.max_attempts = Some(2);
    let (storage, sink) = storage_with_run();

    let summary = run(&config, sink, vec![City::Bremen, City::Dortmund]).await;

    assert_eq!(summary.completed, vec![City::Dortmund]);
    assert_eq!(summary.abandoned, vec![City::Bremen]);
    assert_eq!(
        storage.lock().unwrap().count_listings_by_city().unwrap(),
        vec![("Dortmund".to_string(), 2)]
    );
}
