//! Published catalog generations and the refresh state machine.
//!
//! A [`Generation`] bundles one catalog snapshot with the vocabulary and
//! ranking index derived from it. The engine publishes generations by
//! swapping a single `Arc`; queries clone that `Arc` and never observe a
//! half-built generation. Refreshes serialize on a build lock, and a refresh
//! that waited behind another one adopts that build's outcome instead of
//! loading the catalog again.

use crate::catalog::{CatalogRecord, CatalogSource};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::index::RankingIndex;
use crate::lexicon::Lexicon;
use crate::query::QueryPreprocessor;
use crate::select::{select, ScoredRecord};
use crate::synonyms::SynonymExpander;
use crate::tokenizer::tokenize;
use crate::vocabulary::Vocabulary;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One immutable catalog snapshot with its vocabulary and index.
#[derive(Debug)]
pub struct Generation {
    number: u64,
    records: Vec<CatalogRecord>,
    vocabulary: Vocabulary,
    index: RankingIndex,
    built_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationStats {
    pub generation: u64,
    pub records: usize,
    pub vocabulary_size: usize,
    pub terms: usize,
    pub average_document_length: f32,
    pub built_at: String,
}

impl Generation {
    pub fn build(number: u64, records: Vec<CatalogRecord>, config: &SearchConfig) -> Self {
        let vocabulary = Vocabulary::from_records(&records).with_cache_capacity(config.correction_cache_capacity);
        let documents: Vec<Vec<String>> = records.iter().map(|r| tokenize(&r.document_text())).collect();
        let index = RankingIndex::build(&documents, config.bm25);
        Self { number, records, vocabulary, index, built_at: OffsetDateTime::now_utc() }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn index(&self) -> &RankingIndex {
        &self.index
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            generation: self.number,
            records: self.records.len(),
            vocabulary_size: self.vocabulary.len(),
            terms: self.index.num_terms(),
            average_document_length: self.index.avg_doc_len(),
            built_at: self.built_at.format(&Rfc3339).unwrap_or_default(),
        }
    }

    /// Rank this snapshot against `query`.
    pub fn search(
        &self,
        preprocessor: &QueryPreprocessor,
        query: &str,
        category: Option<&str>,
        k: usize,
    ) -> Vec<ScoredRecord> {
        let tokens = preprocessor.query_tokens(query, &self.vocabulary);
        if tokens.is_empty() {
            tracing::debug!(query, "query has no terms; every record scores 0");
        }
        let scores = self.index.score(&tokens);
        select(&self.records, &scores, category, k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Building,
    Ready,
    Empty,
}

#[derive(Debug)]
enum Published {
    Uninitialized,
    Empty,
    Ready(Arc<Generation>),
}

/// Clears the building flag even if loading the catalog panics.
struct BuildingFlag<'a>(&'a AtomicBool);

impl<'a> BuildingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for BuildingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SearchEngine {
    source: Arc<dyn CatalogSource>,
    preprocessor: QueryPreprocessor,
    config: SearchConfig,
    published: RwLock<Published>,
    last_error: RwLock<Option<SearchError>>,
    build_lock: Mutex<()>,
    building: AtomicBool,
    completed_builds: AtomicU64,
}

impl SearchEngine {
    pub fn new(source: Arc<dyn CatalogSource>, lexicon: Arc<dyn Lexicon>, config: SearchConfig) -> Self {
        let expander = SynonymExpander::new(lexicon, config.max_synonyms);
        let preprocessor = QueryPreprocessor::new(expander, config.correction_cutoff);
        Self {
            source,
            preprocessor,
            config,
            published: RwLock::new(Published::Uninitialized),
            last_error: RwLock::new(None),
            build_lock: Mutex::new(()),
            building: AtomicBool::new(false),
            completed_builds: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn preprocessor(&self) -> &QueryPreprocessor {
        &self.preprocessor
    }

    pub fn state(&self) -> EngineState {
        if self.building.load(Ordering::Acquire) {
            return EngineState::Building;
        }
        match &*self.published.read() {
            Published::Uninitialized => EngineState::Uninitialized,
            Published::Empty => EngineState::Empty,
            Published::Ready(_) => EngineState::Ready,
        }
    }

    /// The published generation, without triggering a build.
    pub fn current(&self) -> Option<Arc<Generation>> {
        match &*self.published.read() {
            Published::Ready(generation) => Some(Arc::clone(generation)),
            _ => None,
        }
    }

    /// Number of builds that have run to completion, successful or not.
    pub fn completed_builds(&self) -> u64 {
        self.completed_builds.load(Ordering::Acquire)
    }

    /// Reload the catalog and publish a new generation.
    ///
    /// On failure a previously published generation keeps serving; without
    /// one the engine moves to the empty state.
    ///
    /// A refresh that queues behind a build already in flight returns that
    /// build's outcome rather than loading again. The in-flight build may have
    /// read the catalog before the caller's change landed; call `refresh`
    /// again once it returns to pick such a change up.
    pub fn refresh(&self) -> Result<Arc<Generation>, SearchError> {
        let seen = self.completed_builds.load(Ordering::Acquire);
        let _guard = self.build_lock.lock();
        if self.completed_builds.load(Ordering::Acquire) != seen {
            tracing::debug!("refresh collapsed into a concurrent build");
            return self.last_outcome();
        }
        self.run_build()
    }

    /// The published generation, building it first if nothing has been built.
    pub fn snapshot(&self) -> Result<Arc<Generation>, SearchError> {
        {
            let published = self.published.read();
            match &*published {
                Published::Ready(generation) => return Ok(Arc::clone(generation)),
                Published::Empty => return Err(SearchError::NoDataAvailable),
                Published::Uninitialized => {}
            }
        }
        self.build_if_uninitialized();
        self.current().ok_or(SearchError::NoDataAvailable)
    }

    /// Rank the published catalog against `query` and return the best `k`.
    pub fn search(&self, query: &str, category: Option<&str>, k: usize) -> Result<Vec<ScoredRecord>, SearchError> {
        let generation = self.snapshot()?;
        Ok(generation.search(&self.preprocessor, query, category, k))
    }

    fn build_if_uninitialized(&self) {
        let _guard = self.build_lock.lock();
        if !matches!(*self.published.read(), Published::Uninitialized) {
            return;
        }
        if let Err(err) = self.run_build() {
            tracing::warn!(error = %err, "lazy catalog build failed");
        }
    }

    fn last_outcome(&self) -> Result<Arc<Generation>, SearchError> {
        if let Some(err) = self.last_error.read().clone() {
            return Err(err);
        }
        self.current().ok_or(SearchError::NoDataAvailable)
    }

    fn run_build(&self) -> Result<Arc<Generation>, SearchError> {
        let flag = BuildingFlag::raise(&self.building);
        let number = self.completed_builds.load(Ordering::Acquire) + 1;
        let outcome = self.load_generation(number).map(Arc::new);
        match &outcome {
            Ok(generation) => {
                *self.published.write() = Published::Ready(Arc::clone(generation));
                let stats = generation.stats();
                tracing::info!(
                    generation = stats.generation,
                    records = stats.records,
                    vocabulary = stats.vocabulary_size,
                    terms = stats.terms,
                    "catalog generation published"
                );
            }
            Err(err) => {
                let mut published = self.published.write();
                if matches!(*published, Published::Ready(_)) {
                    tracing::warn!(error = %err, "refresh failed; keeping previous generation");
                } else {
                    tracing::warn!(error = %err, "refresh failed; no data available");
                    *published = Published::Empty;
                }
            }
        }
        *self.last_error.write() = outcome.as_ref().err().cloned();
        self.completed_builds.fetch_add(1, Ordering::AcqRel);
        drop(flag);
        outcome
    }

    fn load_generation(&self, number: u64) -> Result<Generation, SearchError> {
        let records = self
            .source
            .load()
            .map_err(|err| SearchError::CatalogUnavailable { reason: format!("{err:#}") })?;
        if records.is_empty() {
            return Err(SearchError::CatalogUnavailable { reason: "catalog is empty".into() });
        }
        Ok(Generation::build(number, records, &self.config))
    }
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("state", &self.state())
            .field("completed_builds", &self.completed_builds())
            .finish()
    }
}
