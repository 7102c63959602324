use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::warn;

use crate::error::CheckerError;
use crate::model::{PageSnapshot, Verdict};

use super::checkers;
use super::normalize::normalize_key;

pub type CheckFn = fn(&PageSnapshot) -> Result<CheckOutcome, CheckerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub verdict: Verdict,
    pub evidence: String,
}

impl CheckOutcome {
    pub fn new(verdict: Verdict, evidence: impl Into<String>) -> Self {
        Self {
            verdict,
            evidence: evidence.into(),
        }
    }

    pub fn pass(evidence: impl Into<String>) -> Self {
        Self::new(Verdict::Pass, evidence)
    }

    pub fn warn(evidence: impl Into<String>) -> Self {
        Self::new(Verdict::Warn, evidence)
    }

    pub fn fail(evidence: impl Into<String>) -> Self {
        Self::new(Verdict::Fail, evidence)
    }
}

/// One automated checker and the tip phrasings it answers for.
#[derive(Debug, Clone, Copy)]
pub struct CheckerSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub match_keys: &'static [&'static str],
    pub run: CheckFn,
}

#[derive(Debug)]
pub struct Registry {
    specs: Vec<CheckerSpec>,
    by_key: HashMap<String, usize>,
    /// Normalized keys sorted ascending, for deterministic scans.
    sorted_keys: Vec<(String, usize)>,
    collisions: Vec<String>,
}

static BUILTIN: LazyLock<Registry> =
    LazyLock::new(|| Registry::from_specs(checkers::builtin_specs()));

/// Process-wide registry of the built-in checkers.
pub fn builtin() -> &'static Registry {
    &BUILTIN
}

impl Registry {
    pub fn from_specs(specs: Vec<CheckerSpec>) -> Self {
        let mut by_key = HashMap::new();
        let mut collisions = Vec::new();

        for (index, spec) in specs.iter().enumerate() {
            for raw_key in spec.match_keys {
                let key = normalize_key(raw_key);
                if key.is_empty() {
                    continue;
                }
                match by_key.get(&key) {
                    Some(&owner) if owner != index => {
                        warn!(key = %key, checker = spec.id, "match key already registered; ignoring");
                        collisions.push(key);
                    }
                    Some(_) => {}
                    None => {
                        by_key.insert(key, index);
                    }
                }
            }
        }

        let mut sorted_keys = by_key
            .iter()
            .map(|(key, index)| (key.clone(), *index))
            .collect::<Vec<(String, usize)>>();
        sorted_keys.sort();

        Self {
            specs,
            by_key,
            sorted_keys,
            collisions,
        }
    }

    /// Exact lookup returning the stored key alongside its checker.
    pub fn lookup_entry(&self, normalized_key: &str) -> Option<(&str, &CheckerSpec)> {
        let (key, index) = self.by_key.get_key_value(normalized_key)?;
        Some((key.as_str(), self.specs.get(*index)?))
    }

    /// Every normalized key with its checker, in ascending key order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &CheckerSpec)> {
        self.sorted_keys
            .iter()
            .filter_map(|(key, index)| self.specs.get(*index).map(|spec| (key.as_str(), spec)))
    }

    pub fn specs(&self) -> &[CheckerSpec] {
        &self.specs
    }

    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }
}
