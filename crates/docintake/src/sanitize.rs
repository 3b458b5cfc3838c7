//! Storage-key sanitization and span-safe redaction helpers.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\-_.]").unwrap());
static RE_HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// Turns a suggested document name into an object-store key segment.
///
/// Diacritics are stripped (`é` → `e`), whitespace runs become a single
/// hyphen, anything outside `[A-Za-z0-9._-]` is dropped, repeated hyphens
/// collapse and leading/trailing hyphens are trimmed.
///
/// The result is idempotent: `sanitize_filename(&sanitize_filename(x)) ==
/// sanitize_filename(x)`. It can be empty (e.g. a name made only of CJK
/// characters); callers building keys must check for that.
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let hyphenated = RE_WHITESPACE.replace_all(&stripped, "-");
    let allowed = RE_DISALLOWED.replace_all(&hyphenated, "");
    let collapsed = RE_HYPHENS.replace_all(&allowed, "-");
    collapsed.trim_matches('-').to_string()
}

/// Returns only the filename component of a path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Drops the query string of a URL. Signed storage URLs carry their access
/// token there, so this must run before a URL reaches a log line or span.
///
/// - `https://x.supabase.co/storage/v1/object/sign/documents/a.pdf?token=abc` → `https://x.supabase.co/storage/v1/object/sign/documents/a.pdf?<redacted>`
/// - `https://hooks.example.com/webhook/renom-doc` → unchanged
pub fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?<redacted>", base),
        None => url.to_string(),
    }
}
