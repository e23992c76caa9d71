pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod lexicon;
pub mod query;
pub mod select;
pub mod synonyms;
pub mod tokenizer;
pub mod vocabulary;
pub mod wordnet;

pub use catalog::{CatalogRecord, CatalogSource, JsonCatalog, RecordId, StaticCatalog};
pub use config::{Bm25Params, SearchConfig};
pub use engine::{EngineState, Generation, GenerationStats, SearchEngine};
pub use error::SearchError;
pub use index::{DocId, Posting, RankingIndex, TermId};
pub use lexicon::{open_lexicon, Lexicon, NoLexicon, SynonymTable};
pub use query::QueryPreprocessor;
pub use select::{select, ScoredRecord};
pub use synonyms::SynonymExpander;
pub use vocabulary::Vocabulary;
pub use wordnet::WordNet;
