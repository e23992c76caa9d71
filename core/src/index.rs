use crate::config::Bm25Params;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// BM25 index over a fixed, ordered corpus of token sequences.
///
/// Document ids are positions in the corpus handed to [`RankingIndex::build`],
/// so scores line up with the catalog snapshot the corpus came from.
#[derive(Debug, Clone, Default)]
pub struct RankingIndex {
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    postings: Vec<Vec<Posting>>, // indexed by term id, sorted by doc_id
    doc_lengths: Vec<u32>,
    avg_doc_len: f32,
    params: Bm25Params,
}

impl RankingIndex {
    pub fn build<D, S>(documents: &[D], params: Bm25Params) -> Self
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut postings: Vec<Vec<Posting>> = Vec::new();
        let mut doc_lengths = Vec::with_capacity(documents.len());
        let mut total_len: u64 = 0;

        for (doc_id, doc) in documents.iter().enumerate() {
            let tokens = doc.as_ref();
            doc_lengths.push(tokens.len() as u32);
            total_len += tokens.len() as u64;

            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for token in tokens {
                let token = token.as_ref();
                let tid = match dictionary.get(token) {
                    Some(&tid) => tid,
                    None => {
                        let tid = df.len() as TermId;
                        dictionary.insert(token.to_string(), tid);
                        df.push(0);
                        postings.push(Vec::new());
                        tid
                    }
                };
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
            for (tid, tf) in tf_counts {
                df[tid as usize] += 1;
                postings[tid as usize].push(Posting { doc_id: doc_id as DocId, tf });
            }
        }

        let avg_doc_len = if documents.is_empty() { 0.0 } else { total_len as f32 / documents.len() as f32 };
        tracing::debug!(docs = documents.len(), terms = dictionary.len(), avg_doc_len, "ranking index built");
        Self { dictionary, df, postings, doc_lengths, avg_doc_len, params }
    }

    pub fn num_docs(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn num_terms(&self) -> usize {
        self.dictionary.len()
    }

    pub fn avg_doc_len(&self) -> f32 {
        self.avg_doc_len
    }

    pub fn doc_len(&self, doc_id: DocId) -> Option<u32> {
        self.doc_lengths.get(doc_id as usize).copied()
    }

    /// Number of documents containing `term`.
    pub fn doc_freq(&self, term: &str) -> u32 {
        self.dictionary.get(term).map_or(0, |&tid| self.df[tid as usize])
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.dictionary
            .get(term)
            .map(|&tid| self.postings[tid as usize].as_slice())
            .unwrap_or(&[])
    }

    /// Non-negative inverse document frequency; 0 for terms outside the corpus.
    pub fn idf(&self, term: &str) -> f32 {
        let n = self.doc_freq(term);
        if n == 0 {
            return 0.0;
        }
        let n = n as f32;
        let total = self.num_docs() as f32;
        (1.0 + (total - n + 0.5) / (n + 0.5)).ln()
    }

    /// One score per document, in corpus order.
    ///
    /// Each distinct query token contributes once; tokens missing from the
    /// corpus contribute nothing, so an empty query scores every document 0.
    pub fn score<S: AsRef<str>>(&self, query_tokens: &[S]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_docs()];
        let Bm25Params { k1, b } = self.params;
        let avg = if self.avg_doc_len > 0.0 { self.avg_doc_len } else { 1.0 };
        let mut seen: HashSet<&str> = HashSet::new();
        for token in query_tokens {
            let token = token.as_ref();
            if !seen.insert(token) {
                continue;
            }
            let idf = self.idf(token);
            if idf == 0.0 {
                continue;
            }
            for p in self.postings(token) {
                let tf = p.tf as f32;
                let len = self.doc_lengths[p.doc_id as usize] as f32;
                let norm = k1 * (1.0 - b + b * len / avg);
                scores[p.doc_id as usize] += idf * (tf * (k1 + 1.0)) / (tf + norm);
            }
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn corpus(texts: &[&str]) -> RankingIndex {
        let docs: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();
        RankingIndex::build(&docs, Bm25Params::default())
    }

    #[test]
    fn statistics_are_tracked() {
        let idx = corpus(&["rust rust search", "search engine", ""]);
        assert_eq!(idx.num_docs(), 3);
        assert_eq!(idx.num_terms(), 3);
        assert_eq!(idx.doc_len(0), Some(3));
        assert_eq!(idx.doc_len(2), Some(0));
        assert!((idx.avg_doc_len() - 5.0 / 3.0).abs() < 1e-6);
        assert_eq!(idx.doc_freq("search"), 2);
        assert_eq!(idx.postings("rust"), &[Posting { doc_id: 0, tf: 2 }]);
    }

    #[test]
    fn empty_query_scores_zero() {
        let idx = corpus(&["alpha beta", "gamma"]);
        assert_eq!(idx.score::<String>(&[]), vec![0.0, 0.0]);
    }

    #[test]
    fn single_matching_document_scores_positive() {
        let idx = corpus(&["agriculture farming"]);
        let scores = idx.score(&["agriculture", "farming"]);
        assert_eq!(scores.len(), 1);
        assert!(scores[0] > 0.0);
    }

    #[test]
    fn unknown_terms_contribute_nothing() {
        let idx = corpus(&["alpha beta", "gamma"]);
        assert_eq!(idx.score(&["delta"]), vec![0.0, 0.0]);
        let with = idx.score(&["alpha", "delta"]);
        let without = idx.score(&["alpha"]);
        assert_eq!(with, without);
    }

    #[test]
    fn duplicate_query_tokens_count_once() {
        let idx = corpus(&["alpha beta", "gamma"]);
        assert_eq!(idx.score(&["alpha", "alpha"]), idx.score(&["alpha"]));
    }

    #[test]
    fn rarer_terms_weigh_more() {
        let idx = corpus(&["common rare", "common", "common", "other"]);
        assert!(idx.idf("rare") > idx.idf("common"));
        assert!(idx.idf("common") > 0.0);
    }

    #[test]
    fn term_frequency_saturates_and_length_normalizes() {
        let idx = corpus(&["fintech fintech payments", "fintech payments", "fintech payments banking loans credit cards"]);
        let s = idx.score(&["fintech"]);
        // more occurrences score higher
        assert!(s[0] > s[1]);
        // same tf in a longer document scores lower
        assert!(s[1] > s[2]);
        // saturation: doubling tf does not double the score
        assert!(s[0] < 2.0 * s[1]);
    }

    #[test]
    fn empty_corpus_yields_no_scores() {
        let idx = RankingIndex::build::<Vec<String>, String>(&[], Bm25Params::default());
        assert!(idx.score(&["anything"]).is_empty());
        assert_eq!(idx.avg_doc_len(), 0.0);
    }
}
