//! Controlled vocabulary and the spelling corrector built on it.
//!
//! The vocabulary holds every category and tag of a catalog snapshot,
//! trimmed and lower-cased. Corrections pick the most similar entry when it
//! clears the cutoff. Entries are kept sorted, so among equally similar
//! entries the lexicographically smallest one wins.

use crate::catalog::CatalogRecord;
use parking_lot::Mutex;
use rapidfuzz::distance::indel;
use std::collections::{BTreeSet, HashMap};

/// Similarity of two strings in [0, 100], 100 meaning identical.
///
/// This is the InDel ratio: insertions and deletions only, so a swapped
/// pair of letters costs 2 out of `len(a) + len(b)`.
pub fn similarity(a: &str, b: &str) -> f64 {
    indel::normalized_similarity(a.chars(), b.chars()) * 100.0
}

#[derive(Debug, Default)]
pub struct Vocabulary {
    entries: BTreeSet<String>,
    // best match per word; the cutoff is applied after the lookup
    cache: Mutex<HashMap<String, Option<(String, f64)>>>,
    cache_capacity: usize,
}

impl Vocabulary {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries, cache: Mutex::new(HashMap::new()), cache_capacity: 0 }
    }

    /// Categories plus every individual tag across the snapshot.
    pub fn from_records(records: &[CatalogRecord]) -> Self {
        Self::new(
            records
                .iter()
                .flat_map(|r| std::iter::once(r.category.as_str()).chain(r.tags.iter().map(String::as_str))),
        )
    }

    /// Enable memoization of up to `capacity` corrections.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains(word)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Closest entry with its similarity, first in sorted order on ties.
    pub fn best_match(&self, word: &str) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for entry in &self.entries {
            let score = similarity(word, entry);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((entry.as_str(), score));
                if score >= 100.0 {
                    break;
                }
            }
        }
        best
    }

    /// Return the closest vocabulary entry when it scores at least `cutoff`,
    /// otherwise `word` unchanged. Blank words and an empty vocabulary pass
    /// through untouched.
    pub fn correct(&self, word: &str, cutoff: f64) -> String {
        if word.trim().is_empty() || self.entries.is_empty() {
            return word.to_string();
        }
        let best = self.cached_best_match(word);
        let corrected = match best {
            Some((entry, score)) if score >= cutoff => entry,
            _ => word.to_string(),
        };
        if corrected != word {
            tracing::debug!(word, corrected = %corrected, "vocabulary correction");
        }
        corrected
    }

    fn cached_best_match(&self, word: &str) -> Option<(String, f64)> {
        if self.cache_capacity == 0 {
            return self.best_match(word).map(|(entry, score)| (entry.to_string(), score));
        }
        if let Some(hit) = self.cache.lock().get(word) {
            return hit.clone();
        }
        let best = self.best_match(word).map(|(entry, score)| (entry.to_string(), score));
        let mut cache = self.cache.lock();
        if cache.len() >= self.cache_capacity {
            cache.clear();
        }
        cache.insert(word.to_string(), best.clone());
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::new(["Agriculture", "farming", "iot", "Finance", "banking", " ", "farming"])
    }

    #[test]
    fn entries_are_normalized_and_deduplicated() {
        let v = vocab();
        assert_eq!(v.iter().collect::<Vec<_>>(), vec!["agriculture", "banking", "farming", "finance", "iot"]);
    }

    #[test]
    fn members_correct_to_themselves() {
        let v = vocab();
        for word in ["agriculture", "farming", "iot", "finance", "banking"] {
            assert_eq!(v.correct(word, 80.0), word);
        }
    }

    #[test]
    fn close_misspelling_is_corrected() {
        let v = vocab();
        assert_eq!(v.correct("agricultur", 80.0), "agriculture");
        // transposed letters
        assert_eq!(v.correct("framing", 80.0), "farming");
        // trailing plural on a short entry
        assert_eq!(v.correct("iots", 80.0), "iot");
    }

    #[test]
    fn similarity_is_the_indel_ratio() {
        assert_eq!(similarity("farming", "farming"), 100.0);
        assert!((similarity("framing", "farming") - 600.0 / 7.0).abs() < 1e-9);
        assert!((similarity("iots", "iot") - 600.0 / 7.0).abs() < 1e-9);
        assert_eq!(similarity("zz", "iot"), 0.0);
    }

    #[test]
    fn distant_word_is_unchanged() {
        let v = vocab();
        assert_eq!(v.correct("blockchain", 80.0), "blockchain");
        assert_eq!(v.correct("zz", 80.0), "zz");
    }

    #[test]
    fn blank_word_or_empty_vocabulary_pass_through() {
        assert_eq!(vocab().correct("  ", 80.0), "  ");
        assert_eq!(Vocabulary::default().correct("farmin", 80.0), "farmin");
    }

    #[test]
    fn ties_resolve_to_smallest_entry() {
        // "cat" is one edit from both "bat" and "hat"
        let v = Vocabulary::new(["hat", "bat"]);
        assert_eq!(v.best_match("cat").map(|(e, _)| e), Some("bat"));
        assert_eq!(v.correct("cat", 60.0), "bat");
    }

    #[test]
    fn cached_corrections_match_uncached() {
        let cached = vocab().with_cache_capacity(2);
        let plain = vocab();
        for word in ["agricultur", "bnking", "rocket", "agricultur", "iot"] {
            assert_eq!(cached.correct(word, 80.0), plain.correct(word, 80.0));
        }
        assert!(cached.cache.lock().len() <= 2);
    }

    #[test]
    fn cached_match_honours_each_cutoff() {
        let v = Vocabulary::new(["farming", "finance"]).with_cache_capacity(16);
        assert_eq!(v.correct("framing", 60.0), "farming");
        assert_eq!(v.correct("framing", 95.0), "framing");
        assert_eq!(v.correct("framing", 80.0), "farming");
    }

    #[test]
    fn vocabulary_from_records_uses_categories_and_tags() {
        let records = vec![
            CatalogRecord { category: "Health".into(), tags: vec!["Telemedicine".into()], ..Default::default() },
            CatalogRecord { category: String::new(), tags: vec![], ..Default::default() },
        ];
        let v = Vocabulary::from_records(&records);
        assert_eq!(v.len(), 2);
        assert!(v.contains("health"));
        assert!(v.contains("telemedicine"));
    }
}
