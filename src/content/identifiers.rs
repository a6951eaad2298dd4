use once_cell::sync::Lazy;
use regex::Regex;

static LONG_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{10,}").unwrap());

static HEX_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[0-9a-f]{8,}").unwrap());

static WORD_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+[-_]?\d{3,}$").unwrap());

static HASH_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*?[_-]{1,2}([A-Za-z0-9]{5,})$").unwrap());

/// Prefixes emitted by CSS-in-JS libraries and component frameworks.
const FRAMEWORK_PREFIXES: &[&str] = &[
    "css-",
    "sc-",
    "jsx-",
    "svelte-",
    "ember",
    "ng-",
    "_ngcontent",
    "data-v-",
    "emotion-",
    "makestyles-",
    "mui",
    "chakra-",
    "tw-",
    ":r",
];

/// True when an `id`/`name` value looks machine-generated and will not
/// survive a re-render.
pub fn is_dynamic_identifier(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }

    LONG_DIGIT_RUN.is_match(value) || has_hex_run(value) || looks_generated(value)
}

/// True when a class token is unsuitable as a locator basis.
pub fn is_generated_class(token: &str) -> bool {
    is_dynamic_identifier(token)
}

fn has_hex_run(value: &str) -> bool {
    // A hex run only counts if it carries at least one digit; plain words
    // like "deadbeef" or "facade" are left alone.
    HEX_RUN
        .find_iter(value)
        .any(|m| m.as_str().chars().any(|c| c.is_ascii_digit()))
}

fn looks_generated(value: &str) -> bool {
    if value.contains("__") {
        return true;
    }

    let lower = value.to_lowercase();
    if FRAMEWORK_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }

    if WORD_DIGITS.is_match(value) {
        return true;
    }

    is_bem_hash(value)
}

/// `Button_root_a1B2c`, `title-3xYz1`: a readable stem followed by a
/// mixed letter/digit suffix.
fn is_bem_hash(value: &str) -> bool {
    HASH_SUFFIX
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|suffix| {
            let s = suffix.as_str();
            s.chars().filter(|c| c.is_ascii_digit()).count() >= 2
                && s.chars().any(|c| c.is_ascii_alphabetic())
        })
        .unwrap_or(false)
}
