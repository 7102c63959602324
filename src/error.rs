use std::fmt;

use thiserror::Error;

/// Structural problems with a checklist source. Fatal before evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("checklist is empty: no header row found")]
    Empty,
    #[error("checklist is missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<&'static str> },
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Dns,
    Http4xx(u16),
    Http5xx(u16),
    Tls,
    InvalidUrl,
    Transport,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Dns => write!(f, "dns resolution failed"),
            Self::Http4xx(status) => write!(f, "client error HTTP {status}"),
            Self::Http5xx(status) => write!(f, "server error HTTP {status}"),
            Self::Tls => write!(f, "tls handshake failed"),
            Self::InvalidUrl => write!(f, "invalid url"),
            Self::Transport => write!(f, "transport error"),
        }
    }
}

/// The page could not be retrieved. Fatal to the run; no report is produced.
#[derive(Debug, Clone, Error)]
#[error("failed to fetch {url}: {kind} ({detail})")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, url: &str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.to_string(),
            detail: detail.into(),
        }
    }
}

/// A single automated check misbehaved. Recovered per item as REVIEW.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("{0}")]
    Internal(String),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("exceeded its {budget_ms} ms budget")]
    Timeout { budget_ms: u64 },
    #[error("panicked: {0}")]
    Panicked(String),
}
