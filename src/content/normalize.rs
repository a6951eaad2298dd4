use std::collections::BTreeSet;

/// Words that never carry intent.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "to", "of", "on", "in", "for", "and", "or", "my", "your", "with", "click",
    "press", "tap", "button", "link",
];

/// Lowercased alphanumeric tokens of a phrase, stop words removed.
pub fn intent_tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= 2 && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Share of `intent` tokens found in `haystack`, in `[0, 1]`.
pub fn token_overlap(intent: &BTreeSet<String>, haystack: &str) -> f64 {
    if intent.is_empty() {
        return 0.0;
    }
    let found = intent_tokens(haystack);
    let hits = intent.iter().filter(|t| found.contains(*t)).count();
    hits as f64 / intent.len() as f64
}

pub fn text_fingerprint(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First 12 hex digits of the fingerprint; enough to key a group on one page.
pub fn short_fingerprint(text: &str) -> String {
    let mut fp = text_fingerprint(text);
    fp.truncate(12);
    fp
}
