use std::time::Duration;

use thiserror::Error;

/// A single locator expression could not be evaluated.
///
/// Always absorbed by the caller that tried the locator: a malformed
/// expression counts as "no match" and the cascade moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocatorError {
    /// Expression is empty or whitespace only
    #[error("Empty locator expression")]
    Empty,

    /// Syntax error at a byte offset
    #[error("Malformed locator '{locator}' at offset {offset}: {reason}")]
    Malformed {
        locator: String,
        offset: usize,
        reason: String,
    },

    /// Syntactically valid but outside the supported query subset
    #[error("Unsupported locator '{locator}': {feature}")]
    Unsupported { locator: String, feature: String },
}

impl LocatorError {
    pub fn malformed(locator: &str, offset: usize, reason: impl Into<String>) -> Self {
        LocatorError::Malformed {
            locator: locator.to_string(),
            offset,
            reason: reason.into(),
        }
    }

    pub fn unsupported(locator: &str, feature: impl Into<String>) -> Self {
        LocatorError::Unsupported {
            locator: locator.to_string(),
            feature: feature.into(),
        }
    }
}

/// A scoring backend call for one shard failed.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network / connection failure
    #[error("Scoring backend unreachable: {0}")]
    Transport(String),

    /// Backend answered with a non-success HTTP status
    #[error("Scoring backend returned HTTP {status}")]
    Status { status: u16 },

    /// Response body was not the expected JSON shape
    #[error("Malformed scoring response: {0}")]
    Malformed(String),

    /// Shard exceeded its time budget
    #[error("Scoring backend timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Status {
                status: status.as_u16(),
            }
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Errors surfaced at the CLI boundary while loading inputs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("YAML parse error ({context}): {source}")]
    YamlParse {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unknown element '{0}'")]
    UnknownElement(String),
}
