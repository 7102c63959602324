use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::CheckerError;
use crate::model::{
    CheckItem, CheckResult, Difficulty, MatchKind, PageSnapshot, Priority, Report, ReportSummary,
    Verdict, VerdictCounts,
};
use crate::util::{now_utc_string, sha256_hex};

use super::matcher::resolve;
use super::registry::{CheckFn, CheckOutcome, CheckerSpec, Registry};

pub const MANUAL_REVIEW_EVIDENCE: &str = "no automated check available — manual review required";
pub const UNLISTED_CATEGORY: &str = "Automated (extra)";

#[derive(Debug, Clone, Copy)]
pub struct EvaluationConfig {
    /// Wall-clock budget per checker; 0 runs checkers inline without a deadline.
    pub checker_budget_ms: u64,
    pub include_unlisted: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            checker_budget_ms: 2_000,
            include_unlisted: false,
        }
    }
}

/// Evaluates every item against the snapshot, one result per item in input order.
pub fn evaluate(
    items: &[CheckItem],
    snapshot: &Arc<PageSnapshot>,
    registry: &Registry,
    config: &EvaluationConfig,
) -> Report {
    let started = Instant::now();
    debug!(
        final_url = %snapshot.final_url,
        status = snapshot.status_code,
        items = items.len(),
        budget_ms = config.checker_budget_ms,
        "evaluating checklist"
    );
    let results = items
        .iter()
        .map(|item| evaluate_item(item, snapshot, registry, config))
        .collect::<Vec<CheckResult>>();

    let unlisted = if config.include_unlisted {
        evaluate_unlisted(&results, snapshot, registry, config)
    } else {
        Vec::new()
    };

    let summary = summarize(&results);
    info!(
        items = results.len(),
        pass = summary.counts.pass,
        warn = summary.counts.warn,
        fail = summary.counts.fail,
        review = summary.counts.review,
        decided = summary.counts.decided(),
        unlisted = unlisted.len(),
        score = ?summary.score,
        duration_ms = started.elapsed().as_millis() as u64,
        "evaluation completed"
    );

    Report {
        url: snapshot.requested_url.clone(),
        final_url: snapshot.final_url.clone(),
        generated_at: now_utc_string(),
        checklist_sha256: items_fingerprint(items),
        checker_budget_ms: config.checker_budget_ms,
        results,
        unlisted,
        summary,
    }
}

pub fn evaluate_item(
    item: &CheckItem,
    snapshot: &Arc<PageSnapshot>,
    registry: &Registry,
    config: &EvaluationConfig,
) -> CheckResult {
    let Some(resolution) = resolve(&item.tip, registry) else {
        debug!(tip = %item.tip, "no automated checker; marking for review");
        return CheckResult {
            item: item.clone(),
            verdict: Verdict::Review,
            evidence: MANUAL_REVIEW_EVIDENCE.to_string(),
            matched_checker_id: None,
            match_kind: MatchKind::None,
        };
    };

    debug!(
        tip = %item.tip,
        checker = resolution.spec.id,
        key = resolution.matched_key,
        kind = resolution.kind.as_str(),
        "resolved checker"
    );
    run_spec(item.clone(), resolution.spec, resolution.kind, snapshot, config)
}

/// Score contributions weighted uniformly (`score`) and by priority (`weighted_score`).
pub fn summarize(results: &[CheckResult]) -> ReportSummary {
    let mut counts = VerdictCounts::default();
    for result in results {
        counts.record(result.verdict);
    }

    ReportSummary {
        counts,
        score: weighted_percentage(results, |_| 1.0),
        weighted_score: weighted_percentage(results, |item| item.priority.weight()),
    }
}

fn weighted_percentage(results: &[CheckResult], weight: impl Fn(&CheckItem) -> f64) -> Option<f64> {
    let (earned, possible) = results
        .iter()
        .filter_map(|result| {
            result
                .verdict
                .contribution()
                .map(|contribution| (contribution, weight(&result.item)))
        })
        .fold((0.0, 0.0), |(earned, possible), (contribution, weight)| {
            (earned + contribution * weight, possible + weight)
        });

    (possible > 0.0).then(|| earned / possible * 100.0)
}

fn evaluate_unlisted(
    results: &[CheckResult],
    snapshot: &Arc<PageSnapshot>,
    registry: &Registry,
    config: &EvaluationConfig,
) -> Vec<CheckResult> {
    let referenced = results
        .iter()
        .filter_map(|result| result.matched_checker_id.as_deref())
        .collect::<HashSet<&str>>();

    registry
        .specs()
        .iter()
        .filter(|spec| !referenced.contains(spec.id))
        .map(|spec| {
            let item = CheckItem {
                category: UNLISTED_CATEGORY.to_string(),
                tip: spec.name.to_string(),
                priority: Priority::Medium,
                difficulty: Difficulty::Medium,
                explanation: String::new(),
                source_row: 0,
            };
            run_spec(item, spec, MatchKind::Unlisted, snapshot, config)
        })
        .collect()
}

fn run_spec(
    item: CheckItem,
    spec: &CheckerSpec,
    match_kind: MatchKind,
    snapshot: &Arc<PageSnapshot>,
    config: &EvaluationConfig,
) -> CheckResult {
    let (verdict, evidence) = match run_bounded(spec, snapshot, config.checker_budget_ms) {
        Ok(CheckOutcome { verdict, evidence }) => (verdict, evidence),
        Err(err) => {
            warn!(
                checker = spec.id,
                tip = %item.tip,
                error = %err,
                "automated check failed; downgrading to review"
            );
            (
                Verdict::Review,
                format!("automated check `{}` failed: {err} — manual review required", spec.id),
            )
        }
    };

    CheckResult {
        item,
        verdict,
        evidence,
        matched_checker_id: Some(spec.id.to_string()),
        match_kind,
    }
}

/// Runs a checker with panic containment and, when `budget_ms > 0`, a deadline.
/// A checker that overruns is abandoned on its worker thread.
fn run_bounded(
    spec: &CheckerSpec,
    snapshot: &Arc<PageSnapshot>,
    budget_ms: u64,
) -> Result<CheckOutcome, CheckerError> {
    if budget_ms == 0 {
        return run_contained(spec.run, snapshot);
    }

    let (sender, receiver) = mpsc::channel();
    let run = spec.run;
    let shared = Arc::clone(snapshot);
    thread::Builder::new()
        .name(format!("checker-{}", spec.id))
        .spawn(move || {
            // the receiver is gone once the budget has expired
            let _ = sender.send(run_contained(run, &shared));
        })
        .map_err(|err| CheckerError::Internal(format!("failed to spawn checker thread: {err}")))?;

    match receiver.recv_timeout(Duration::from_millis(budget_ms)) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(CheckerError::Timeout { budget_ms }),
        Err(RecvTimeoutError::Disconnected) => Err(CheckerError::Panicked(
            "checker thread exited without a result".to_string(),
        )),
    }
}

fn run_contained(run: CheckFn, snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    match panic::catch_unwind(AssertUnwindSafe(|| run(snapshot))) {
        Ok(result) => result,
        Err(payload) => Err(CheckerError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn items_fingerprint(items: &[CheckItem]) -> String {
    let canonical = items
        .iter()
        .map(|item| {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                item.category,
                item.tip,
                item.priority.as_str(),
                item.difficulty.as_str(),
                item.explanation
            )
        })
        .collect::<Vec<String>>()
        .join("\n");
    sha256_hex(canonical.as_bytes())
}
