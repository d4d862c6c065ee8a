//! Data models for car listings and Telegram API payloads

use serde::{Deserialize, Serialize};

/// Placeholder for listing fields the search page didn't provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// A car advertisement scraped from an AutoTrader search page.
///
/// Constructed fresh on every run and never mutated; only the `id`
/// outlives the run, inside the seen-set file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub price: String,
    pub mileage: String,
    pub year: String,
    pub transmission: String,
    pub fuel_type: String,
    pub description: String,
    pub url: String,
}

/// Body of a Telegram `sendMessage` call.
#[derive(Debug, Serialize)]
pub struct TelegramMessage {
    pub chat_id: String,
    pub text: String,
    pub disable_web_page_preview: bool,
}

/// Telegram API response envelope. Telegram reports application-level
/// failures through `ok`, independent of the HTTP status.
#[derive(Debug, Deserialize)]
pub struct TelegramResponse {
    pub ok: bool,
    pub description: Option<String>,
}
