//! Place-name normalization for gazetteer lookups.
//!
//! Applied symmetrically when the gazetteer is built and when a name is
//! looked up, so that `"Cape Coast"`, `"cape  coast."` and `" CAPE COAST "`
//! all produce the same key.

use regex::Regex;
use std::sync::LazyLock;

/// Punctuation that never contributes to place matching. Hyphens are kept
/// because they are part of names such as `sekondi-takoradi`.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.,#'"/\\()\[\]:;!?]+"#).expect("valid regex"));

/// Regex to collapse runs of whitespace into a single space.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalizes a place name into its lookup key.
///
/// The pipeline:
/// 1. Lowercase
/// 2. Replace punctuation (other than `-`) with spaces
/// 3. Collapse whitespace
/// 4. Trim
#[must_use]
pub fn normalize(input: &str) -> String {
    let lower = input.to_lowercase();
    let no_punct = PUNCTUATION_RE.replace_all(&lower, " ");
    WHITESPACE_RE.replace_all(&no_punct, " ").trim().to_string()
}
