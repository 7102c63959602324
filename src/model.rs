use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Ordering rank where 1 is the most urgent.
    pub fn rank(self) -> f64 {
        match self {
            Self::High => 1.0,
            Self::Medium => 2.0,
            Self::Low => 3.0,
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            Self::High => 3.0,
            Self::Medium => 2.0,
            Self::Low => 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
    Review,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [Self::Pass, Self::Warn, Self::Fail, Self::Review];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
            Self::Review => "REVIEW",
        }
    }

    /// Score contribution; REVIEW is excluded from scoring altogether.
    pub fn contribution(self) -> Option<f64> {
        match self {
            Self::Pass => Some(1.0),
            Self::Warn => Some(0.5),
            Self::Fail => Some(0.0),
            Self::Review => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckItem {
    pub category: String,
    pub tip: String,
    pub priority: Priority,
    pub difficulty: Difficulty,
    pub explanation: String,
    /// 1-based line of the row in the checklist source; 0 for synthesized items.
    #[serde(default)]
    pub source_row: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Contains,
    /// Run directly because no checklist item referenced the checker.
    Unlisted,
    None,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::Unlisted => "unlisted",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub item: CheckItem,
    pub verdict: Verdict,
    pub evidence: String,
    pub matched_checker_id: Option<String>,
    pub match_kind: MatchKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
    pub review: usize,
}

impl VerdictCounts {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.pass += 1,
            Verdict::Warn => self.warn += 1,
            Verdict::Fail => self.fail += 1,
            Verdict::Review => self.review += 1,
        }
    }

    pub fn get(&self, verdict: Verdict) -> usize {
        match verdict {
            Verdict::Pass => self.pass,
            Verdict::Warn => self.warn,
            Verdict::Fail => self.fail,
            Verdict::Review => self.review,
        }
    }

    pub fn decided(&self) -> usize {
        self.pass + self.warn + self.fail
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub counts: VerdictCounts,
    /// Percentage over decided items; `None` when every item needs review.
    pub score: Option<f64>,
    pub weighted_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub url: String,
    pub final_url: String,
    pub generated_at: String,
    /// Fingerprint of the evaluated items, in evaluation order.
    pub checklist_sha256: String,
    pub checker_budget_ms: u64,
    pub results: Vec<CheckResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unlisted: Vec<CheckResult>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 390,
            height: 844,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub elapsed_ms: u64,
    pub body_bytes: usize,
}

/// Fetched page state shared read-only by every checker of one analysis.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub requested_url: String,
    pub final_url: String,
    pub status_code: u16,
    pub html: String,
    /// Header names are lower-cased.
    pub headers: BTreeMap<String, String>,
    pub viewport: Viewport,
    pub timing: Timing,
    /// Probed auxiliary resources (favicon candidates) and their HTTP status.
    pub resources: BTreeMap<String, Option<u16>>,
}

impl PageSnapshot {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn resource_resolved(&self, url: &str) -> bool {
        matches!(self.resources.get(url), Some(Some(status)) if (200..300).contains(status))
    }
}
