//! Telegram notification delivery.
//!
//! Each new listing is formatted into one plain-text message and posted to
//! the Bot API's `sendMessage` endpoint. Delivery is confirmed twice: the
//! HTTP status, then the `ok` flag in the response envelope, since Telegram
//! reports application errors with a 200 as well. A failed delivery is the
//! caller's problem to count; nothing here retries.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::config::SearchParams;
use crate::models::{Listing, NOT_AVAILABLE, TelegramMessage, TelegramResponse};
use crate::scrapers::autotrader::{MAX_MILEAGE_MILES, MAX_PRICE_POUNDS, MIN_YEAR};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram caps messages at 4096 chars; long dealer descriptions are cut
/// well before the rest of the message can threaten that limit.
const MAX_DESCRIPTION_CHARS: usize = 400;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Telegram returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("Telegram API error: {0}")]
    Api(String),
}

pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;

        Ok(Self {
            client,
            bot_token,
            chat_id,
        })
    }

    /// Deliver one new-listing alert.
    pub async fn send_new_listing(
        &self,
        listing: &Listing,
        annotation: Option<&str>,
        search: &SearchParams,
    ) -> Result<(), NotifyError> {
        let message = TelegramMessage {
            chat_id: self.chat_id.clone(),
            text: format_message(listing, annotation, search),
            disable_web_page_preview: false,
        };

        let url = format!("{TELEGRAM_API_BASE}/bot{}/sendMessage", self.bot_token);
        let response = self.client.post(&url).json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }

        let body: TelegramResponse = response.json().await?;
        if !body.ok {
            return Err(NotifyError::Api(
                body.description
                    .unwrap_or_else(|| "no description given".to_string()),
            ));
        }

        info!("notification sent for listing: {}", listing.title);
        Ok(())
    }
}

/// Batch-wide medians used to derive the cosmetic attention grabber.
/// Listings whose price or mileage doesn't parse are left out of the
/// medians and never annotated.
#[derive(Debug)]
pub struct BatchStats {
    median_price: Option<u32>,
    median_mileage: Option<u32>,
}

impl BatchStats {
    pub fn of(batch: &[Listing]) -> Self {
        Self {
            median_price: median(batch.iter().filter_map(|l| parse_number(&l.price)).collect()),
            median_mileage: median(
                batch.iter().filter_map(|l| parse_number(&l.mileage)).collect(),
            ),
        }
    }

    /// An annotation when the listing beats the batch on price and/or
    /// mileage. Purely cosmetic; never used to filter.
    pub fn annotate(&self, listing: &Listing) -> Option<String> {
        let mut notes = Vec::new();

        if let (Some(price), Some(median)) = (parse_number(&listing.price), self.median_price)
            && price < median
        {
            notes.push("below median price");
        }
        if let (Some(mileage), Some(median)) = (parse_number(&listing.mileage), self.median_mileage)
            && mileage < median
        {
            notes.push("below median mileage");
        }

        (!notes.is_empty()).then(|| notes.join(" · "))
    }
}

/// Pull the numeric value out of a display string like "£14,500" or
/// "32,000 miles". None when the string carries no digits.
fn parse_number(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn median(mut values: Vec<u32>) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[values.len() / 2])
}

fn format_message(listing: &Listing, annotation: Option<&str>, search: &SearchParams) -> String {
    let mut text = String::from("🚗 New AutoTrader listing!\n\n");

    text.push_str(&format!("📍 {}\n", listing.title));
    text.push_str(&format!(
        "   {} | {} | {} | {}\n",
        listing.year, listing.mileage, listing.transmission, listing.fuel_type
    ));
    text.push_str(&format!("💰 {}\n", listing.price));

    if listing.description != NOT_AVAILABLE {
        text.push_str(&format!(
            "📝 {}\n",
            truncate(&listing.description, MAX_DESCRIPTION_CHARS)
        ));
    }
    if let Some(note) = annotation {
        text.push_str(&format!("⭐ {note}\n"));
    }
    text.push_str(&format!("🔗 {}\n", listing.url));

    text.push_str(&criteria_summary(search));
    text
}

fn criteria_summary(search: &SearchParams) -> String {
    format!(
        "\n📋 Search criteria:\n\
         • Make/model: {} {}\n\
         • Year: {MIN_YEAR} and newer\n\
         • Price: under £{}\n\
         • Mileage: under {} miles\n\
         • Transmission: automatic only\n\
         • Write-offs excluded\n",
        search.make,
        search.model,
        group_thousands(MAX_PRICE_POUNDS),
        group_thousands(MAX_MILEAGE_MILES),
    )
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Cut `text` to at most `max` chars, on a char boundary, with a trailing
/// ellipsis when anything was dropped.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}
