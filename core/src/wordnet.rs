//! Reader for a Princeton WordNet 3.x `dict/` directory.
//!
//! Index files are loaded into lemma -> offset maps; data files are kept as
//! raw bytes and synset lines are parsed on demand at their byte offset.

use crate::lexicon::Lexicon;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pos {
    Noun,
    Verb,
    Adj,
    Adv,
}

impl Pos {
    /// Lookup order for senses.
    const ALL: [Pos; 4] = [Pos::Noun, Pos::Verb, Pos::Adj, Pos::Adv];

    fn suffix(self) -> &'static str {
        match self {
            Pos::Noun => "noun",
            Pos::Verb => "verb",
            Pos::Adj => "adj",
            Pos::Adv => "adv",
        }
    }

    /// Suffix detachment rules used to find a base form.
    fn substitutions(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Pos::Noun => &[
                ("s", ""),
                ("ses", "s"),
                ("ves", "f"),
                ("xes", "x"),
                ("zes", "z"),
                ("ches", "ch"),
                ("shes", "sh"),
                ("men", "man"),
                ("ies", "y"),
            ],
            Pos::Verb => &[
                ("s", ""),
                ("ies", "y"),
                ("es", "e"),
                ("es", ""),
                ("ed", "e"),
                ("ed", ""),
                ("ing", "e"),
                ("ing", ""),
            ],
            Pos::Adj => &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")],
            Pos::Adv => &[],
        }
    }
}

#[derive(Debug, Default)]
struct PosTable {
    index: HashMap<String, Vec<usize>>,
    exceptions: HashMap<String, Vec<String>>,
    data: Vec<u8>,
}

impl PosTable {
    fn load(dir: &Path, pos: Pos) -> Result<Self> {
        let index_path = dir.join(format!("index.{}", pos.suffix()));
        let data_path = dir.join(format!("data.{}", pos.suffix()));
        let index_text = fs::read_to_string(&index_path).with_context(|| format!("reading {}", index_path.display()))?;
        let data = fs::read(&data_path).with_context(|| format!("reading {}", data_path.display()))?;

        let mut index = HashMap::new();
        for line in index_text.lines() {
            // License header lines start with a space.
            if line.starts_with(' ') || line.trim().is_empty() {
                continue;
            }
            if let Some((lemma, offsets)) = parse_index_line(line) {
                index.insert(lemma, offsets);
            }
        }

        let mut exceptions = HashMap::new();
        let exc_path = dir.join(format!("{}.exc", pos.suffix()));
        if let Ok(exc_text) = fs::read_to_string(&exc_path) {
            for line in exc_text.lines() {
                let mut fields = line.split_whitespace();
                if let Some(inflected) = fields.next() {
                    let bases: Vec<String> = fields.map(str::to_string).collect();
                    if !bases.is_empty() {
                        exceptions.insert(inflected.to_string(), bases);
                    }
                }
            }
        }

        Ok(Self { index, exceptions, data })
    }

    /// Candidate base forms of `form` that exist in this part of speech.
    fn base_forms(&self, form: &str, pos: Pos) -> Vec<String> {
        let mut candidates = vec![form.to_string()];
        if let Some(bases) = self.exceptions.get(form) {
            candidates.extend(bases.iter().cloned());
        } else {
            for (old, new) in pos.substitutions() {
                if let Some(stem) = form.strip_suffix(old) {
                    candidates.push(format!("{stem}{new}"));
                }
            }
        }
        let mut out: Vec<String> = Vec::new();
        for c in candidates {
            if !c.is_empty() && self.index.contains_key(&c) && !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    fn synset_lemmas(&self, offset: usize) -> Option<Vec<String>> {
        let tail = self.data.get(offset..)?;
        let end = tail.iter().position(|&b| b == b'\n').unwrap_or(tail.len());
        let line = std::str::from_utf8(&tail[..end]).ok()?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first()?.parse::<usize>().ok()? != offset {
            tracing::warn!(offset, "wordnet data offset mismatch");
            return None;
        }
        let w_cnt = usize::from_str_radix(fields.get(3)?, 16).ok()?;
        let mut lemmas = Vec::with_capacity(w_cnt);
        for i in 0..w_cnt {
            let word = fields.get(4 + 2 * i)?;
            // Adjective position markers: (a), (p), (ip)
            let word = match word.find('(') {
                Some(at) if word.ends_with(')') => &word[..at],
                _ => word,
            };
            lemmas.push(word.to_string());
        }
        Some(lemmas)
    }
}

fn parse_index_line(line: &str) -> Option<(String, Vec<usize>)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let lemma = fields.first()?.to_string();
    let synset_cnt: usize = fields.get(2)?.parse().ok()?;
    let p_cnt: usize = fields.get(3)?.parse().ok()?;
    // lemma pos synset_cnt p_cnt [ptr_symbol]{p_cnt} sense_cnt tagsense_cnt offsets...
    let start = 4 + p_cnt + 2;
    let offsets = fields.get(start..start + synset_cnt)?.iter().filter_map(|f| f.parse().ok()).collect();
    Some((lemma, offsets))
}

/// WordNet senses for words in all four parts of speech.
#[derive(Debug)]
pub struct WordNet {
    tables: Vec<(Pos, PosTable)>,
}

impl WordNet {
    /// Load `index.*`, `data.*` and the optional `*.exc` files from `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut tables = Vec::with_capacity(Pos::ALL.len());
        for pos in Pos::ALL {
            tables.push((pos, PosTable::load(dir, pos)?));
        }
        let lemmas: usize = tables.iter().map(|(_, t)| t.index.len()).sum();
        tracing::info!(dir = %dir.display(), lemmas, "wordnet loaded");
        Ok(Self { tables })
    }
}

impl Lexicon for WordNet {
    fn synsets(&self, word: &str) -> Vec<Vec<String>> {
        let form = word.trim().to_lowercase().replace(' ', "_");
        if form.is_empty() {
            return Vec::new();
        }
        let mut senses = Vec::new();
        for (pos, table) in &self.tables {
            for base in table.base_forms(&form, *pos) {
                for &offset in table.index.get(&base).map(Vec::as_slice).unwrap_or(&[]) {
                    if let Some(lemmas) = table.synset_lemmas(offset) {
                        senses.push(lemmas);
                    }
                }
            }
        }
        senses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "  1 This software and database is being provided under license.\n";

    /// Write a data file whose synsets start at their real byte offsets and
    /// return those offsets.
    fn write_data(dir: &Path, pos: &str, synsets: &[(&str, &[&str])]) -> Vec<usize> {
        let mut text = String::from(HEADER);
        let mut offsets = Vec::new();
        for (ss_type, words) in synsets {
            let offset = text.len();
            offsets.push(offset);
            let mut line = format!("{offset:08} 04 {ss_type} {:02x}", words.len());
            for w in *words {
                line.push_str(&format!(" {w} 0"));
            }
            line.push_str(" 000 | gloss text\n");
            text.push_str(&line);
        }
        fs::write(dir.join(format!("data.{pos}")), text).unwrap();
        offsets
    }

    fn write_index(dir: &Path, pos: &str, p: char, entries: &[(&str, Vec<usize>)]) {
        let mut text = String::from(HEADER);
        for (lemma, offsets) in entries {
            let offs: Vec<String> = offsets.iter().map(|o| format!("{o:08}")).collect();
            text.push_str(&format!("{lemma} {p} {} 1 @ {} 0 {}\n", offsets.len(), offsets.len(), offs.join(" ")));
        }
        fs::write(dir.join(format!("index.{pos}")), text).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        let noun = write_data(
            p,
            "noun",
            &[
                ("n", &["farming", "agriculture", "husbandry"][..]),
                ("n", &["mouse"][..]),
                ("n", &["bank", "depository_financial_institution"][..]),
            ],
        );
        write_index(
            p,
            "noun",
            'n',
            &[
                ("farming", vec![noun[0]]),
                ("agriculture", vec![noun[0]]),
                ("husbandry", vec![noun[0]]),
                ("mouse", vec![noun[1]]),
                ("bank", vec![noun[2]]),
                ("depository_financial_institution", vec![noun[2]]),
            ],
        );
        let verb = write_data(p, "verb", &[("v", &["farm", "grow", "raise", "produce"][..])]);
        write_index(p, "verb", 'v', &[("farm", vec![verb[0]])]);
        let adj = write_data(p, "adj", &[("s", &["smart(a)", "bright"][..])]);
        write_index(p, "adj", 'a', &[("smart", vec![adj[0]])]);
        write_data(p, "adv", &[]);
        write_index(p, "adv", 'r', &[]);
        fs::write(p.join("noun.exc"), "mice mouse\n").unwrap();
        dir
    }

    #[test]
    fn finds_senses_across_parts_of_speech() {
        let dir = fixture();
        let wn = WordNet::open(dir.path()).unwrap();
        // "farming" is a noun and, via the -ing rule, the verb "farm"
        let senses = wn.synsets("farming");
        assert_eq!(
            senses,
            vec![vec!["farming", "agriculture", "husbandry"], vec!["farm", "grow", "raise", "produce"]]
        );
        assert_eq!(wn.synsets("farms"), vec![vec!["farm", "grow", "raise", "produce"]]);
    }

    #[test]
    fn applies_exceptions_and_strips_markers() {
        let dir = fixture();
        let wn = WordNet::open(dir.path()).unwrap();
        assert_eq!(wn.synsets("mice"), vec![vec!["mouse"]]);
        assert_eq!(wn.synsets("Smart"), vec![vec!["smart", "bright"]]);
    }

    #[test]
    fn multi_word_lookup_and_unknown_words() {
        let dir = fixture();
        let wn = WordNet::open(dir.path()).unwrap();
        assert_eq!(wn.synsets("depository financial institution").len(), 1);
        assert!(wn.synsets("blockchain").is_empty());
        assert!(wn.synsets("  ").is_empty());
    }

    #[test]
    fn missing_files_fail_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WordNet::open(dir.path()).is_err());
    }
}
