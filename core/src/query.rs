use crate::synonyms::SynonymExpander;
use crate::tokenizer::tokenize;
use crate::vocabulary::Vocabulary;
use std::collections::BTreeSet;

/// Turns a raw query into the set of terms handed to the ranking index.
#[derive(Debug, Clone)]
pub struct QueryPreprocessor {
    expander: SynonymExpander,
    cutoff: f64,
}

impl QueryPreprocessor {
    pub fn new(expander: SynonymExpander, cutoff: f64) -> Self {
        Self { expander, cutoff }
    }

    pub fn expander(&self) -> &SynonymExpander {
        &self.expander
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Tokenize, correct each token against `vocabulary`, and add the
    /// synonyms of the corrected token.
    ///
    /// The result holds whole corrected words and synonym phrases; an empty
    /// or punctuation-only query yields an empty set.
    pub fn preprocess(&self, query: &str, vocabulary: &Vocabulary) -> BTreeSet<String> {
        let mut terms = BTreeSet::new();
        for token in tokenize(query) {
            let corrected = vocabulary.correct(&token, self.cutoff);
            terms.extend(self.expander.synonyms(&corrected));
            terms.insert(corrected);
        }
        tracing::debug!(query, terms = ?terms, "preprocessed query");
        terms
    }

    /// [`preprocess`](Self::preprocess) flattened into single tokens, ready
    /// for scoring.
    pub fn query_tokens(&self, query: &str, vocabulary: &Vocabulary) -> Vec<String> {
        let tokens: BTreeSet<String> = self
            .preprocess(query, vocabulary)
            .iter()
            .flat_map(|term| tokenize(term))
            .collect();
        tokens.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{NoLexicon, SynonymTable};
    use std::sync::Arc;

    fn preprocessor() -> QueryPreprocessor {
        let table: SynonymTable = vec![
            vec!["agriculture", "farming", "husbandry"],
            vec!["iot", "internet_of_things"],
        ]
        .into_iter()
        .collect();
        QueryPreprocessor::new(SynonymExpander::new(Arc::new(table), 3), 80.0)
    }

    fn vocabulary() -> Vocabulary {
        Vocabulary::new(["Agriculture", "iot", "Finance"])
    }

    #[test]
    fn corrects_then_expands_the_corrected_token() {
        let terms = preprocessor().preprocess("Agricultre", &vocabulary());
        let expected: BTreeSet<String> =
            ["agriculture", "farming", "husbandry"].iter().map(|s| s.to_string()).collect();
        assert_eq!(terms, expected);
    }

    #[test]
    fn repeated_tokens_collapse() {
        let terms = preprocessor().preprocess("finance FINANCE finance!", &vocabulary());
        assert_eq!(terms.into_iter().collect::<Vec<_>>(), vec!["finance"]);
    }

    #[test]
    fn empty_or_punctuation_query_is_empty() {
        assert!(preprocessor().preprocess("", &vocabulary()).is_empty());
        assert!(preprocessor().preprocess("?!", &vocabulary()).is_empty());
    }

    #[test]
    fn multi_word_synonyms_split_into_tokens() {
        let p = preprocessor();
        let terms = p.preprocess("iot", &vocabulary());
        assert!(terms.contains("internet of things"));
        let tokens = p.query_tokens("iot", &vocabulary());
        assert_eq!(tokens, vec!["internet", "iot", "of", "things"]);
    }

    #[test]
    fn without_lexicon_only_corrections_remain() {
        let p = QueryPreprocessor::new(SynonymExpander::new(Arc::new(NoLexicon), 3), 80.0);
        let tokens = p.query_tokens("financ startups", &vocabulary());
        assert_eq!(tokens, vec!["finance", "startups"]);
    }
}
