use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// A general-purpose lexical database.
pub trait Lexicon: Send + Sync {
    /// Senses of `word`, each given as its lemma names in database order.
    /// Unknown words yield no senses.
    fn synsets(&self, word: &str) -> Vec<Vec<String>>;
}

/// A lexicon that knows no words.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLexicon;

impl Lexicon for NoLexicon {
    fn synsets(&self, _word: &str) -> Vec<Vec<String>> {
        Vec::new()
    }
}

/// Groups of interchangeable words held in memory.
///
/// A word may belong to several groups; its senses come back in the order the
/// groups were added.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    groups: Vec<Vec<String>>,
    by_word: HashMap<String, Vec<usize>>,
}

impl SynonymTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group: Vec<String> = words
            .into_iter()
            .map(Into::into)
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if group.is_empty() {
            return;
        }
        let gid = self.groups.len();
        for word in &group {
            let ids = self.by_word.entry(word.to_lowercase()).or_default();
            if !ids.contains(&gid) {
                ids.push(gid);
            }
        }
        self.groups.push(group);
    }

    /// Read a JSON array of groups, e.g. `[["farming", "agriculture"]]`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("opening synonym table {}", path.display()))?;
        let groups: Vec<Vec<String>> = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("{}: expected an array of string arrays", path.display()))?;
        let mut table = Self::new();
        for g in groups {
            table.add_group(g);
        }
        tracing::info!(path = %path.display(), groups = table.len(), "synonym table loaded");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Vec<S>> for SynonymTable {
    fn from_iter<T: IntoIterator<Item = Vec<S>>>(iter: T) -> Self {
        let mut table = Self::new();
        for g in iter {
            table.add_group(g);
        }
        table
    }
}

impl Lexicon for SynonymTable {
    fn synsets(&self, word: &str) -> Vec<Vec<String>> {
        self.by_word
            .get(&word.trim().to_lowercase())
            .map(|ids| ids.iter().map(|&i| self.groups[i].clone()).collect())
            .unwrap_or_default()
    }
}

/// Pick the lexical database: a WordNet directory wins over a JSON synonym
/// table; with neither, synonym expansion is disabled.
pub fn open_lexicon(wordnet: Option<&Path>, synonyms: Option<&Path>) -> Result<Arc<dyn Lexicon>> {
    if let Some(dir) = wordnet {
        return Ok(Arc::new(crate::wordnet::WordNet::open(dir)?));
    }
    if let Some(path) = synonyms {
        return Ok(Arc::new(SynonymTable::from_json_file(path)?));
    }
    tracing::warn!("no lexical database configured; synonym expansion disabled");
    Ok(Arc::new(NoLexicon))
}
