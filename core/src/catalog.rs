use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub type RecordId = i64;

/// One catalog entry in the fixed shape the ranking core works with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CatalogRecord {
    /// The text indexed for this record: title, category, description, then tags.
    pub fn document_text(&self) -> String {
        format!("{} {} {} {}", self.title, self.category, self.description, self.tags.join(" "))
    }
}

/// Supplies a full catalog snapshot on every refresh.
pub trait CatalogSource: Send + Sync {
    fn load(&self) -> Result<Vec<CatalogRecord>>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: Vec<CatalogRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self { records }
    }
}

impl CatalogSource for StaticCatalog {
    fn load(&self) -> Result<Vec<CatalogRecord>> {
        Ok(self.records.clone())
    }
}

/// Catalog read from a `.json`/`.jsonl` file or a directory of them.
///
/// The file is re-read on every load, so editing it and refreshing picks up
/// the new contents.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.path.is_dir() {
            for entry in WalkDir::new(&self.path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                    files.push(p.to_path_buf());
                }
            }
        } else if self.path.is_file() {
            files.push(self.path.clone());
        } else {
            anyhow::bail!("catalog path {} does not exist", self.path.display());
        }
        Ok(files)
    }
}

impl CatalogSource for JsonCatalog {
    fn load(&self) -> Result<Vec<CatalogRecord>> {
        let mut records = Vec::new();
        for file in self.files()? {
            if extension(&file) == Some("jsonl") {
                read_jsonl(&file, &mut records)?;
            } else {
                read_json(&file, &mut records)?;
            }
        }
        tracing::debug!(path = %self.path.display(), records = records.len(), "catalog loaded");
        Ok(records)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, out: &mut Vec<CatalogRecord>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON", file.display(), lineno + 1))?;
        out.push(normalize_record(&value));
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<CatalogRecord>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: Value = serde_json::from_reader(reader).with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        Value::Array(arr) => out.extend(arr.iter().map(normalize_record)),
        Value::Object(_) => out.push(normalize_record(&json)),
        _ => tracing::warn!(file = %file.display(), "ignoring catalog file without objects"),
    }
    Ok(())
}

/// Coerce a loosely-typed JSON object into a [`CatalogRecord`].
///
/// Absent, null or mistyped fields become empty values; nothing here fails.
pub fn normalize_record(value: &Value) -> CatalogRecord {
    let category = match value.get("category") {
        Some(v) if !v.is_null() => text_field(Some(v)),
        _ => text_field(value.get("industry")),
    };
    CatalogRecord {
        id: id_field(value.get("id")),
        title: text_field(value.get("title")),
        description: text_field(value.get("description")),
        category,
        tags: tags_field(value.get("tags")),
    }
}

fn id_field(v: Option<&Value>) -> RecordId {
    match v {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return i;
            }
            tracing::warn!(id = %n, "non-integer record id, defaulting to 0");
            0
        }
        Some(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(id = %s, "non-numeric record id, defaulting to 0");
            0
        }),
        _ => 0,
    }
}

fn text_field(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn tags_field(v: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => {
            let s = s.trim();
            // Postgres array literal, e.g. {farming,"smart iot"}
            let inner = s.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')).unwrap_or(s);
            split_list(inner)
        }
        _ => Vec::new(),
    };
    raw.into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect()
}

/// Split on commas outside double quotes. Quotes are dropped and `\x`
/// yields `x`, as in a Postgres array literal.
fn split_list(s: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => quoted = !quoted,
            '\\' => current.extend(chars.next()),
            ',' if !quoted => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_text_joins_fields_in_order() {
        let r = CatalogRecord {
            id: 1,
            title: "AgriTech Farming".into(),
            description: "crop yield optimization".into(),
            category: "Agriculture".into(),
            tags: vec!["farming".into(), "iot".into()],
        };
        assert_eq!(r.document_text(), "AgriTech Farming Agriculture crop yield optimization farming iot");
    }

    #[test]
    fn missing_and_null_fields_become_empty() {
        let r = normalize_record(&json!({"id": 7, "title": null}));
        assert_eq!(r.id, 7);
        assert_eq!(r.title, "");
        assert_eq!(r.category, "");
        assert!(r.tags.is_empty());
    }

    #[test]
    fn industry_is_an_alias_for_category() {
        let r = normalize_record(&json!({"id": "12", "industry": "Finance"}));
        assert_eq!(r.id, 12);
        assert_eq!(r.category, "Finance");
        let both = normalize_record(&json!({"category": "Health", "industry": "Finance"}));
        assert_eq!(both.category, "Health");
    }

    #[test]
    fn tags_accept_several_shapes() {
        let arr = normalize_record(&json!({"tags": ["ai", 3, null, {"x": 1}, " "]}));
        assert_eq!(arr.tags, vec!["ai", "3"]);
        let pg = normalize_record(&json!({"tags": "{farming,\"smart iot\"}"}));
        assert_eq!(pg.tags, vec!["farming", "smart iot"]);
        let quoted = normalize_record(&json!({"tags": r#"{"a,b",c,"say \"hi\""}"#}));
        assert_eq!(quoted.tags, vec!["a,b", "c", "say \"hi\""]);
        let csv = normalize_record(&json!({"tags": "banking, payments"}));
        assert_eq!(csv.tags, vec!["banking", "payments"]);
        let bad = normalize_record(&json!({"tags": 42}));
        assert!(bad.tags.is_empty());
    }

    #[test]
    fn json_catalog_reads_array_jsonl_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"[{"id": 1, "title": "One"}, {"id": 2, "title": "Two"}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("b.jsonl"), "{\"id\": 3, \"title\": \"Three\"}\n\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let all = JsonCatalog::new(dir.path()).load().unwrap();
        let ids: Vec<RecordId> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let single = JsonCatalog::new(dir.path().join("b.jsonl")).load().unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn json_catalog_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(JsonCatalog::new(dir.path().join("nope.json")).load().is_err());
    }
}
