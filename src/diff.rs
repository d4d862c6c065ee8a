//! Novelty detection: which listings in the current batch have never been
//! seen before.

use std::collections::HashSet;

use crate::models::Listing;
use crate::state::SeenSet;

/// Result of diffing one batch against the persisted seen-set.
#[derive(Debug)]
pub struct NoveltyReport {
    /// Listings whose id is absent from the prior seen-set, in original
    /// batch order.
    pub new_listings: Vec<Listing>,
    /// Every id in the current batch; becomes the next seen-set.
    pub current_ids: SeenSet,
}

/// Pure function of (batch, prior seen-set). Membership is decided by id
/// alone, so an edited advert that keeps its id is never re-reported.
pub fn detect_new(batch: &[Listing], seen: &SeenSet) -> NoveltyReport {
    let current_ids: HashSet<String> = batch.iter().map(|l| l.id.clone()).collect();

    let new_listings = batch
        .iter()
        .filter(|listing| !seen.contains(&listing.id))
        .cloned()
        .collect();

    NoveltyReport {
        new_listings,
        current_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_AVAILABLE;

    fn listing(id: &str) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("2021 BMW 3 Series {id}"),
            price: "£13,000".to_string(),
            mileage: "50,000 miles".to_string(),
            year: "2021".to_string(),
            transmission: "Automatic".to_string(),
            fuel_type: NOT_AVAILABLE.to_string(),
            description: "clean, one owner".to_string(),
            url: format!("https://example.test/ad/{id}"),
        }
    }

    #[test]
    fn first_run_everything_is_new() {
        let batch = vec![listing("a"), listing("b")];
        let report = detect_new(&batch, &SeenSet::new());

        assert_eq!(report.new_listings, batch);
        assert_eq!(report.current_ids.len(), 2);
    }

    #[test]
    fn seen_ids_are_skipped_and_order_preserved() {
        let batch = vec![listing("a"), listing("b"), listing("c")];
        let seen: SeenSet = ["b".to_string()].into_iter().collect();

        let report = detect_new(&batch, &seen);
        let new_ids: Vec<&str> = report.new_listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(new_ids, ["a", "c"]);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let batch = vec![listing("a"), listing("b")];
        let seen: SeenSet = ["a".to_string()].into_iter().collect();

        let first = detect_new(&batch, &seen);
        let second = detect_new(&batch, &seen);
        assert_eq!(first.new_listings, second.new_listings);
        assert_eq!(first.current_ids, second.current_ids);
    }

    #[test]
    fn idempotent_against_its_own_output() {
        let batch = vec![listing("a"), listing("b")];
        let report = detect_new(&batch, &SeenSet::new());

        let rerun = detect_new(&batch, &report.current_ids);
        assert!(rerun.new_listings.is_empty());
        assert_eq!(rerun.current_ids, report.current_ids);
    }

    #[test]
    fn unchanged_batch_produces_no_notifications() {
        let batch = vec![listing("b")];
        let seen: SeenSet = ["b".to_string()].into_iter().collect();

        let report = detect_new(&batch, &seen);
        assert!(report.new_listings.is_empty());
        assert_eq!(report.current_ids, seen);
    }
}
