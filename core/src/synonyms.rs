use crate::lexicon::Lexicon;
use std::collections::HashSet;
use std::sync::Arc;

/// Expands a word into a few lexical synonyms.
///
/// Lemmas are taken in lexicon traversal order. Underscores become spaces,
/// duplicates and the word itself are skipped, and at most `limit` survive.
#[derive(Clone)]
pub struct SynonymExpander {
    lexicon: Arc<dyn Lexicon>,
    limit: usize,
}

impl SynonymExpander {
    pub fn new(lexicon: Arc<dyn Lexicon>, limit: usize) -> Self {
        Self { lexicon, limit }
    }

    pub fn synonyms(&self, word: &str) -> Vec<String> {
        let word = word.trim();
        if word.is_empty() || self.limit == 0 {
            return Vec::new();
        }
        let own = word.to_lowercase().replace('_', " ");
        let mut out: Vec<String> = Vec::with_capacity(self.limit);
        let mut seen: HashSet<String> = HashSet::new();
        for sense in self.lexicon.synsets(word) {
            for lemma in sense {
                let readable = lemma.replace('_', " ");
                let key = readable.to_lowercase();
                if key == own || !seen.insert(key) {
                    continue;
                }
                out.push(readable);
                if out.len() >= self.limit {
                    return out;
                }
            }
        }
        out
    }
}

impl std::fmt::Debug for SynonymExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynonymExpander").field("limit", &self.limit).finish()
    }
}
