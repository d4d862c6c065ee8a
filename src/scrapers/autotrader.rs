//! AutoTrader UK search scraper.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::config::SearchParams;
use crate::models::{Listing, NOT_AVAILABLE};
use crate::traits::{FetchError, ListingSource};

const BASE_URL: &str = "https://www.autotrader.co.uk";

// Fixed quality filters, encoded into every search URL.
pub const MIN_YEAR: u32 = 2020;
pub const MAX_PRICE_POUNDS: u32 = 15_000;
pub const MAX_MILEAGE_MILES: u32 = 80_000;
pub const TRANSMISSION: &str = "Automatic";

const MAX_PAGES: u32 = 5;
const PAGE_DELAY: Duration = Duration::from_millis(500);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

const FUEL_TYPES: [&str; 7] = [
    "Petrol",
    "Diesel",
    "Electric",
    "Hybrid",
    "Petrol Hybrid",
    "Diesel Hybrid",
    "Petrol Plug-in Hybrid",
];

pub struct AutoTraderScraper {
    client: Client,
}

impl AutoTraderScraper {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }

    fn build_search_url(params: &SearchParams, page: u32) -> String {
        let pairs: [(&str, String); 14] = [
            ("sort", "sponsored".to_string()),
            ("radius", params.radius.to_string()),
            ("postcode", params.postcode.clone()),
            ("onesearchad", "Used".to_string()),
            ("onesearchad", "Nearly New".to_string()),
            ("onesearchad", "New".to_string()),
            ("make", params.make.clone()),
            ("model", params.model.clone()),
            ("year-from", MIN_YEAR.to_string()),
            ("price-to", MAX_PRICE_POUNDS.to_string()),
            ("maximum-mileage", MAX_MILEAGE_MILES.to_string()),
            ("transmission", TRANSMISSION.to_string()),
            ("exclude-writeoff-categories", "on".to_string()),
            ("page", page.to_string()),
        ];

        let query = pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{BASE_URL}/car-search?{query}")
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        debug!("fetching {url}");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ListingSource for AutoTraderScraper {
    fn source_name(&self) -> &'static str {
        "AutoTrader"
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>, FetchError> {
        info!(
            "searching {} for {} {} around {} ({} mile radius)",
            self.source_name(),
            params.make,
            params.model,
            params.postcode,
            params.radius
        );

        let first_page = self.fetch_page(&Self::build_search_url(params, 1)).await?;
        let pages = page_count(&first_page).min(MAX_PAGES);
        debug!("parsing {pages} page(s) of results");

        let mut listings = parse_search_page(&first_page);
        for page in 2..=pages {
            tokio::time::sleep(PAGE_DELAY).await;
            let html = self.fetch_page(&Self::build_search_url(params, page)).await?;
            listings.extend(parse_search_page(&html));
        }

        // Sponsored adverts can repeat across pages; keep the first occurrence.
        let mut ids_seen = HashSet::new();
        listings.retain(|listing| ids_seen.insert(listing.id.clone()));

        info!("found {} listing(s) across {pages} page(s)", listings.len());
        Ok(listings)
    }
}

/// Total result-page count as reported by the pagination widget, e.g.
/// "Page 1 of 4". Defaults to 1 when the widget is missing or unreadable.
fn page_count(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let selector = Selector::parse("li.paginationMini__count").unwrap();

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .and_then(|text| {
            text.split_whitespace()
                .rev()
                .find_map(|token| token.parse().ok())
        })
        .unwrap_or(1)
}

struct CardSelectors {
    title: Selector,
    link: Selector,
    specs: Selector,
    price: Selector,
    description: Selector,
}

impl CardSelectors {
    fn new() -> Self {
        Self {
            title: Selector::parse("h2.listing-title").unwrap(),
            link: Selector::parse("h2.listing-title a").unwrap(),
            specs: Selector::parse("ul.listing-key-specs li").unwrap(),
            price: Selector::parse("div.vehicle-price").unwrap(),
            description: Selector::parse("p.listing-description").unwrap(),
        }
    }
}

/// Extract every listing from one search-results page, in page order.
/// A result card that can't produce a listing is skipped; it never aborts
/// the rest of the page.
fn parse_search_page(html: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let result_selector = Selector::parse("li.search-page__result").unwrap();
    let selectors = CardSelectors::new();

    let mut listings = Vec::new();
    for result in document.select(&result_selector) {
        match parse_result(&result, &selectors) {
            Some(listing) => listings.push(listing),
            None => warn!("skipping a result card with no usable title"),
        }
    }

    listings
}

fn parse_result(result: &ElementRef, selectors: &CardSelectors) -> Option<Listing> {
    // Without a title there is nothing to identify the advert by.
    let title = result
        .select(&selectors.title)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())?;

    let url = result
        .select(&selectors.link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(absolute_url);

    let id = url
        .as_deref()
        .and_then(advert_id)
        .unwrap_or_else(|| format!("{:x}", md5::compute(&title)));

    let specs: Vec<String> = result.select(&selectors.specs).map(element_text).collect();

    let year = specs
        .iter()
        .find(|s| looks_like_year(s))
        .cloned()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let mileage = specs
        .iter()
        .find(|s| s.to_lowercase().contains("miles"))
        .cloned()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let transmission = specs
        .iter()
        .find(|s| s.as_str() == "Automatic" || s.as_str() == "Manual")
        .cloned()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let fuel_type = specs
        .iter()
        .find(|s| FUEL_TYPES.contains(&s.as_str()))
        .cloned()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let price = result
        .select(&selectors.price)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let description = result
        .select(&selectors.description)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Some(Listing {
        id,
        title,
        price,
        mileage,
        year,
        transmission,
        fuel_type,
        description,
        url: url.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    })
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn absolute_url(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{BASE_URL}{href}")
    }
}

/// The advert id AutoTrader embeds as the trailing path segment of the
/// listing URL, e.g. `/car-details/202407125551234`.
fn advert_id(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.trim_end_matches('/').rsplit('/').next()?;

    (!segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .then(|| segment.to_string())
}

/// Key-spec entries for the registration year read like "2021 (21 reg)".
fn looks_like_year(spec: &str) -> bool {
    spec.get(..4)
        .and_then(|prefix| prefix.parse::<u32>().ok())
        .is_some_and(|year| (1960..=2100).contains(&year))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
        <ul>
          <li class="paginationMini__count">Page 1 of 3</li>
        </ul>
        <ul>
          <li class="search-page__result">
            <h2 class="listing-title">
              <a href="/car-details/202407125551234?postcode=E15">2021 BMW 3 Series 320i M Sport</a>
            </h2>
            <ul class="listing-key-specs">
              <li>2021 (21 reg)</li>
              <li>Saloon</li>
              <li>32,000 miles</li>
              <li>2.0L</li>
              <li>Automatic</li>
              <li>Petrol</li>
            </ul>
            <div class="vehicle-price">£14,500</div>
            <p class="listing-description">Full service history, two keys.</p>
          </li>
          <li class="search-page__result">
            <ul class="listing-key-specs"><li>2020 (70 reg)</li></ul>
            <div class="vehicle-price">£9,000</div>
          </li>
          <li class="search-page__result">
            <h2 class="listing-title">2022 BMW 318d SE</h2>
            <ul class="listing-key-specs">
              <li>2022 (22 reg)</li>
              <li>45,010 miles</li>
              <li>Automatic</li>
            </ul>
            <p class="listing-description">One owner from new.</p>
          </li>
        </ul>
        </body></html>
    "#;

    #[test]
    fn parses_complete_listing() {
        let listings = parse_search_page(SEARCH_PAGE);
        let first = &listings[0];

        assert_eq!(first.id, "202407125551234");
        assert_eq!(first.title, "2021 BMW 3 Series 320i M Sport");
        assert_eq!(first.price, "£14,500");
        assert_eq!(first.mileage, "32,000 miles");
        assert_eq!(first.year, "2021 (21 reg)");
        assert_eq!(first.transmission, "Automatic");
        assert_eq!(first.fuel_type, "Petrol");
        assert_eq!(first.description, "Full service history, two keys.");
        assert_eq!(
            first.url,
            "https://www.autotrader.co.uk/car-details/202407125551234?postcode=E15"
        );
    }

    #[test]
    fn malformed_card_skipped_without_aborting_batch() {
        let listings = parse_search_page(SEARCH_PAGE);

        // The titleless middle card is dropped; the third card survives it.
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[1].title, "2022 BMW 318d SE");
    }

    #[test]
    fn missing_fields_become_placeholders() {
        let listings = parse_search_page(SEARCH_PAGE);
        let partial = &listings[1];

        assert_eq!(partial.price, NOT_AVAILABLE);
        assert_eq!(partial.fuel_type, NOT_AVAILABLE);
        assert_eq!(partial.url, NOT_AVAILABLE);
        assert_eq!(partial.mileage, "45,010 miles");
    }

    #[test]
    fn listing_without_link_gets_stable_hashed_id() {
        let listings = parse_search_page(SEARCH_PAGE);
        let partial = &listings[1];

        assert_eq!(partial.id, format!("{:x}", md5::compute("2022 BMW 318d SE")));
        assert_eq!(parse_search_page(SEARCH_PAGE)[1].id, partial.id);
    }

    #[test]
    fn empty_page_is_not_an_error() {
        assert!(parse_search_page("<html><body></body></html>").is_empty());
    }

    #[test]
    fn page_count_reads_trailing_number() {
        assert_eq!(page_count(SEARCH_PAGE), 3);
        assert_eq!(page_count("<html><body></body></html>"), 1);
    }

    #[test]
    fn search_url_encodes_all_fixed_filters() {
        let params = SearchParams {
            make: "BMW".to_string(),
            model: "3 Series".to_string(),
            postcode: "E15 4EQ".to_string(),
            radius: 150_000,
        };
        let url = AutoTraderScraper::build_search_url(&params, 2);

        assert!(url.starts_with("https://www.autotrader.co.uk/car-search?"));
        assert!(url.contains("sort=sponsored"));
        assert!(url.contains("radius=150000"));
        assert!(url.contains("postcode=E15%204EQ"));
        assert!(url.contains("make=BMW"));
        assert!(url.contains("model=3%20Series"));
        assert!(url.contains("year-from=2020"));
        assert!(url.contains("price-to=15000"));
        assert!(url.contains("maximum-mileage=80000"));
        assert!(url.contains("transmission=Automatic"));
        assert!(url.contains("exclude-writeoff-categories=on"));
        assert!(url.contains("onesearchad=Nearly%20New"));
        assert!(url.ends_with("page=2"));
    }

    #[test]
    fn advert_id_requires_numeric_segment() {
        assert_eq!(
            advert_id("https://www.autotrader.co.uk/car-details/202407125551234?x=1"),
            Some("202407125551234".to_string())
        );
        assert_eq!(advert_id("https://www.autotrader.co.uk/car-search"), None);
    }
}
