use crate::catalog::CatalogRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: CatalogRecord,
    pub score: f32,
}

/// Whether `record` passes an optional category filter.
///
/// A blank filter passes everything; otherwise the category must equal the
/// filter ignoring case.
pub fn category_matches(record: &CatalogRecord, filter: Option<&str>) -> bool {
    match filter {
        Some(f) if !f.trim().is_empty() => record.category.to_lowercase() == f.to_lowercase(),
        _ => true,
    }
}

/// Pair records with their scores, filter by category, and keep the best `k`.
///
/// Ordering is by descending score; equal scores keep snapshot order.
pub fn select(records: &[CatalogRecord], scores: &[f32], category: Option<&str>, k: usize) -> Vec<ScoredRecord> {
    let mut candidates: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .take(records.len())
        .filter(|(i, _)| category_matches(&records[*i], category))
        .collect();
    // sort_by is stable, which is what keeps ties in snapshot order
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates
        .into_iter()
        .take(k)
        .map(|(i, score)| ScoredRecord { record: records[i].clone(), score })
        .collect()
}
