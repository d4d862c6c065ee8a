//! One-run orchestration: fetch, filter, diff, notify, persist.

use anyhow::{Context, Result, bail};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::diff;
use crate::filter;
use crate::models::Listing;
use crate::scrapers::AutoTraderScraper;
use crate::state::{STATE_FILE, StateStore};
use crate::telegram::{BatchStats, TelegramNotifier};
use crate::traits::ListingSource;

/// Counters for one completed run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub scraped: usize,
    pub kept: usize,
    pub previously_seen: usize,
    pub new: usize,
    pub notified: usize,
    pub failed_notifications: usize,
}

pub struct CarScout<S: ListingSource> {
    source: S,
    store: StateStore,
    notifier: TelegramNotifier,
    config: Config,
}

impl CarScout<AutoTraderScraper> {
    pub fn new(config: Config) -> Result<Self> {
        let source = AutoTraderScraper::new().context("failed to build scraping client")?;
        let notifier = TelegramNotifier::new(config.bot_token.clone(), config.chat_id.clone())
            .context("failed to build Telegram client")?;

        Ok(Self {
            source,
            store: StateStore::new(STATE_FILE),
            notifier,
            config,
        })
    }
}

impl<S: ListingSource> CarScout<S> {
    /// Execute one full run. Invocations are externally scheduled; nothing
    /// here loops or sleeps between runs.
    pub async fn run(&self) -> Result<RunSummary> {
        let seen = self.store.load();

        let batch = self
            .source
            .search(&self.config.search)
            .await
            .with_context(|| format!("{} search failed", self.source.source_name()))?;
        let scraped = batch.len();

        let kept: Vec<Listing> = batch
            .into_iter()
            .filter(|listing| match filter::matched_keyword(listing) {
                Some(keyword) => {
                    info!("excluding {:?}: matched {keyword:?}", listing.title);
                    false
                }
                None => true,
            })
            .collect();

        let report = diff::detect_new(&kept, &seen);
        let stats = BatchStats::of(&kept);

        if report.new_listings.is_empty() {
            info!("no new listings found");
        } else {
            info!("found {} new listing(s)", report.new_listings.len());
        }

        let mut notified = 0;
        let mut failed = 0;
        for listing in &report.new_listings {
            info!("new listing: {} - {}", listing.title, listing.price);
            let annotation = stats.annotate(listing);

            match self
                .notifier
                .send_new_listing(listing, annotation.as_deref(), &self.config.search)
                .await
            {
                Ok(()) => notified += 1,
                Err(err) => {
                    error!("failed to notify for {:?}: {err}", listing.title);
                    failed += 1;
                }
            }
        }

        if failed > 0 && notified == 0 {
            // State stays unsaved so the next run retries this whole batch.
            bail!("all {failed} notification(s) failed");
        }

        if report.current_ids.is_empty() {
            warn!("search returned no listings; leaving state file untouched");
        } else if let Err(err) = self.store.save(&report.current_ids) {
            // A lost save means this batch is re-notified next run.
            error!("could not save state file: {err}");
        } else {
            info!("state updated with {} listing id(s)", report.current_ids.len());
        }

        Ok(RunSummary {
            scraped,
            kept: kept.len(),
            previously_seen: seen.len(),
            new: report.new_listings.len(),
            notified,
            failed_notifications: failed,
        })
    }
}
