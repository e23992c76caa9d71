use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // A token is a maximal run of word characters; everything else separates.
    static ref RE: Regex = Regex::new(r"(?u)\w+").expect("valid regex");
}

/// Tokenize text into lower-cased word tokens using NFKC normalization.
///
/// Underscores count as word characters, so `c_d` stays one token while
/// `A-B` splits into `a` and `b`.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized)
        .map(|mat| mat.as_str().to_string())
        .collect()
}
