use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Dynamic content categories
// ============================================================================

/// Kind of runtime-mutating content recognized in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DynamicCategory {
    Price,
    Date,
    Time,
    Percentage,
    Timestamp,
    BookingCode,
    InventoryCounter,
    SocialCounter,
    Status,
}

/// One classifier hit: the category and the byte span it covered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicMatch {
    pub category: DynamicCategory,
    pub start: usize,
    pub end: usize,
    pub matched: String,
}

/// How strongly a piece of text disqualifies itself as a locator basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// `Medium` and `High` veto a candidate's stability tier.
    pub fn is_veto(self) -> bool {
        self >= Severity::Medium
    }
}

// ============================================================================
// Pattern rules (evaluated in this order)
// ============================================================================

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:[$€£¥₹]\s?\d[\d,]*(?:\.\d{1,2})?)|(?:\b\d[\d,]*(?:\.\d{1,2})?\s?(?:(?:usd|eur|gbp|jpy|inr)\b|[€£$]))",
    )
    .unwrap()
});

/// Full or abbreviated month names, whole words only ("Mar" but not "Mars").
const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b";

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b\d{{4}}-\d{{2}}-\d{{2}}\b|\b\d{{1,2}}/\d{{1,2}}/\d{{2,4}}\b|\b{MONTH}\.?\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,\s*\d{{4}})?\b|\b\d{{1,2}}\s+{MONTH}|\b(?:today|yesterday|tomorrow)\b|\b\d+\s+(?:seconds?|minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?)\s+ago\b",
    ))
    .unwrap()
});

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}(?::\d{2})?(?:\s?[AaPp][Mm])?\b").unwrap());

static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-+]?\b\d+(?:\.\d+)?\s?%").unwrap());

static LONG_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{10,}").unwrap());

static CODE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z0-9]{6,10}\b").unwrap());

static INVENTORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:only\s+)?\d+\s+(?:left|remaining|in stock|available|sold)\b|\b(?:in stock|out of stock|sold out|low stock)\b",
    )
    .unwrap()
});

static SOCIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b\d[\d,.]*[km]?\s+(?:reviews?|ratings?|likes?|followers?|comments?|views?|shares?|stars?|votes?)\b|\b\d(?:\.\d)?\s*(?:out of|/)\s*5\b",
    )
    .unwrap()
});

static STATUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:loading|updating|processing|pending|refreshing|please wait|syncing|saving|online|offline|typing)\b",
    )
    .unwrap()
});

/// Run every rule over `text` and return all hits.
///
/// Total: returns an empty vector for stable text and never panics.
/// Results are ordered by rule, then by position within the text.
pub fn classify(text: &str) -> Vec<DynamicMatch> {
    let mut matches = Vec::new();

    collect(&PRICE_RE, DynamicCategory::Price, text, &mut matches);
    collect(&DATE_RE, DynamicCategory::Date, text, &mut matches);
    collect(&TIME_RE, DynamicCategory::Time, text, &mut matches);
    collect(&PERCENT_RE, DynamicCategory::Percentage, text, &mut matches);
    collect(&LONG_DIGITS_RE, DynamicCategory::Timestamp, text, &mut matches);

    // Booking / confirmation codes: uppercase alphanumerics mixing letters and digits
    for m in CODE_TOKEN_RE.find_iter(text) {
        let token = m.as_str();
        let has_digit = token.chars().any(|c| c.is_ascii_digit());
        let has_alpha = token.chars().any(|c| c.is_ascii_uppercase());
        if has_digit && has_alpha {
            matches.push(DynamicMatch {
                category: DynamicCategory::BookingCode,
                start: m.start(),
                end: m.end(),
                matched: token.to_string(),
            });
        }
    }

    collect(&INVENTORY_RE, DynamicCategory::InventoryCounter, text, &mut matches);
    collect(&SOCIAL_RE, DynamicCategory::SocialCounter, text, &mut matches);
    collect(&STATUS_RE, DynamicCategory::Status, text, &mut matches);

    matches
}

fn collect(re: &Regex, category: DynamicCategory, text: &str, out: &mut Vec<DynamicMatch>) {
    for m in re.find_iter(text) {
        out.push(DynamicMatch {
            category,
            start: m.start(),
            end: m.end(),
            matched: m.as_str().to_string(),
        });
    }
}

// ============================================================================
// Severity mapping
// ============================================================================

/// Maps classifier categories to severities.
///
/// The thresholds are heuristic constants, so they are data: the default
/// can be overridden from the `severity` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityPolicy {
    #[serde(default = "default_high")]
    pub high: Vec<DynamicCategory>,

    #[serde(default = "default_medium")]
    pub medium: Vec<DynamicCategory>,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            high: default_high(),
            medium: default_medium(),
        }
    }
}

fn default_high() -> Vec<DynamicCategory> {
    vec![
        DynamicCategory::Price,
        DynamicCategory::Timestamp,
        DynamicCategory::BookingCode,
    ]
}

fn default_medium() -> Vec<DynamicCategory> {
    vec![
        DynamicCategory::Date,
        DynamicCategory::Time,
        DynamicCategory::SocialCounter,
    ]
}

impl SeverityPolicy {
    pub fn category_severity(&self, category: DynamicCategory) -> Severity {
        if self.high.contains(&category) {
            Severity::High
        } else if self.medium.contains(&category) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Highest severity across all matches; `Low` when there are none.
    pub fn severity(&self, matches: &[DynamicMatch]) -> Severity {
        matches
            .iter()
            .map(|m| self.category_severity(m.category))
            .max()
            .unwrap_or(Severity::Low)
    }

    /// Classify and grade in one call.
    pub fn grade(&self, text: &str) -> Severity {
        self.severity(&classify(text))
    }
}

/// Severity under the default policy.
pub fn severity(matches: &[DynamicMatch]) -> Severity {
    SeverityPolicy::default().severity(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_text_has_no_matches() {
        assert!(classify("Login").is_empty());
        assert!(classify("Add to cart").is_empty());
        assert!(classify("").is_empty());
    }

    #[test]
    fn price_span_is_reported() {
        let matches = classify("Now only $24.99!");
        let price = matches
            .iter()
            .find(|m| m.category == DynamicCategory::Price)
            .expect("price match");
        assert_eq!(price.matched, "$24.99");
        assert_eq!(&"Now only $24.99!"[price.start..price.end], "$24.99");
    }

    #[test]
    fn booking_code_requires_letters_and_digits() {
        assert!(classify("PNR X7K9P2").iter().any(|m| m.category == DynamicCategory::BookingCode));
        assert!(!classify("SUBMIT").iter().any(|m| m.category == DynamicCategory::BookingCode));
    }
}
