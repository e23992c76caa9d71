/// Conditions the search core reports to its callers.
///
/// Per-token problems during correction or synonym lookup never surface here;
/// they fall back to the unchanged word or an empty expansion.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A refresh could not obtain any records.
    #[error("catalog unavailable: {reason}")]
    CatalogUnavailable { reason: String },
    /// The engine is in the empty state; there is nothing to rank.
    #[error("no data available")]
    NoDataAvailable,
}
