//! URL normalisation for duplicate detection
//!
//! Two results point at the same page when their normalised forms match.
//! `http` and `https` fold together, a leading `www.` is dropped, and the
//! trailing slash, query string and fragment are removed. Host and path
//! compare case-insensitively.

use url::Url;

/// Normalise a URL into its deduplication key.
///
/// Unparseable input is trimmed and lowercased so that it still compares
/// stably against itself.
pub fn normalize_url(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return raw.trim().to_lowercase();
    };

    let host = parsed
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_lowercase())
        .unwrap_or_default();

    let mut key = match parsed.scheme() {
        "http" | "https" => String::new(),
        other => format!("{other}://"),
    };
    key.push_str(&host);

    if let Some(port) = parsed.port() {
        key.push_str(&format!(":{port}"));
    }

    key.push_str(&parsed.path().trim_end_matches('/').to_lowercase());
    key
}
