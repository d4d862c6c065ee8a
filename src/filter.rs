//! Write-off exclusion filter.

use crate::models::Listing;

/// Keywords that mark an advert as an insurance write-off or otherwise
/// damaged. Matched case-insensitively as substrings of title and
/// description.
const WRITEOFF_KEYWORDS: [&str; 10] = [
    "cat s",
    "cat n",
    "cat c",
    "cat d",
    "salvage",
    "damaged",
    "write-off",
    "write off",
    "accident damage",
    "insurance write off",
];

/// Returns the first exclusion keyword found in the listing's title or
/// description, if any.
pub fn matched_keyword(listing: &Listing) -> Option<&'static str> {
    let haystack = format!("{} {}", listing.title, listing.description).to_lowercase();
    WRITEOFF_KEYWORDS
        .iter()
        .find(|keyword| haystack.contains(*keyword))
        .copied()
}

/// Binary keep/discard decision: discard when any keyword occurs.
pub fn is_writeoff(listing: &Listing) -> bool {
    matched_keyword(listing).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_AVAILABLE;

    fn listing(title: &str, description: &str) -> Listing {
        Listing {
            id: "1".to_string(),
            title: title.to_string(),
            price: "£12,000".to_string(),
            mileage: "40,000 miles".to_string(),
            year: "2021".to_string(),
            transmission: "Automatic".to_string(),
            fuel_type: NOT_AVAILABLE.to_string(),
            description: description.to_string(),
            url: "https://example.test/ad/1".to_string(),
        }
    }

    #[test]
    fn every_keyword_discards() {
        for keyword in WRITEOFF_KEYWORDS {
            let hit = listing("2021 BMW 3 Series", &format!("one owner, {keyword} repaired"));
            assert!(is_writeoff(&hit), "keyword {keyword:?} should discard");
        }
    }

    #[test]
    fn match_is_case_insensitive() {
        let hit = listing("BMW 320i CAT S REPAIRED", "tidy car");
        assert_eq!(matched_keyword(&hit), Some("cat s"));

        let hit = listing("BMW 320i", "Insurance Write Off, drives well");
        assert!(is_writeoff(&hit));
    }

    #[test]
    fn title_and_description_both_scanned() {
        assert!(is_writeoff(&listing("Salvage project", "runs and drives")));
        assert!(is_writeoff(&listing("BMW 320d M Sport", "light accident damage")));
    }

    #[test]
    fn clean_listing_kept() {
        let clean = listing(
            "2022 BMW 318i Sport",
            "full service history, two keys, one previous owner",
        );
        assert_eq!(matched_keyword(&clean), None);
        assert!(!is_writeoff(&clean));
    }

    #[test]
    fn substring_match_catches_keyword_inside_larger_word() {
        // "undamaged" contains "damaged"
        assert!(is_writeoff(&listing("BMW 320i", "undamaged example")));
    }
}
