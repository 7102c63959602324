use std::sync::Arc;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use super::checklist;
use super::evaluate::{
    EvaluationConfig, MANUAL_REVIEW_EVIDENCE, UNLISTED_CATEGORY, evaluate, summarize,
};
use super::registry::{CheckOutcome, CheckerSpec, Registry, builtin};
use crate::error::CheckerError;
use crate::model::{
    CheckItem, CheckResult, Difficulty, MatchKind, PageSnapshot, Priority, Verdict,
};

fn item(tip: &str, priority: Priority) -> CheckItem {
    CheckItem {
        category: "Test".to_string(),
        tip: tip.to_string(),
        priority,
        difficulty: Difficulty::Easy,
        explanation: String::new(),
        source_row: 0,
    }
}

fn snapshot(final_url: &str, html: &str) -> Arc<PageSnapshot> {
    Arc::new(PageSnapshot {
        requested_url: final_url.to_string(),
        final_url: final_url.to_string(),
        status_code: 200,
        html: html.to_string(),
        ..Default::default()
    })
}

fn result_with(verdict: Verdict, priority: Priority) -> CheckResult {
    CheckResult {
        item: item("x", priority),
        verdict,
        evidence: String::new(),
        matched_checker_id: None,
        match_kind: MatchKind::None,
    }
}

fn passes(_: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    Ok(CheckOutcome::pass("ok"))
}

fn errors(_: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    Err(CheckerError::Internal("selector blew up".to_string()))
}

fn panics(_: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    panic!("checker exploded")
}

fn stalls(_: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    thread::sleep(Duration::from_millis(400));
    Ok(CheckOutcome::pass("too late"))
}

fn faulty_registry() -> Registry {
    Registry::from_specs(vec![
        CheckerSpec {
            id: "steady",
            name: "Steady",
            match_keys: &["steady"],
            run: passes,
        },
        CheckerSpec {
            id: "erroring",
            name: "Erroring",
            match_keys: &["erroring"],
            run: errors,
        },
        CheckerSpec {
            id: "panicking",
            name: "Panicking",
            match_keys: &["panicking"],
            run: panics,
        },
        CheckerSpec {
            id: "stalling",
            name: "Stalling",
            match_keys: &["stalling"],
            run: stalls,
        },
    ])
}

#[test]
fn bundled_checklist_yields_one_result_per_item_in_order() {
    let checklist = checklist::load_default().expect("bundled checklist loads");
    let page = snapshot(
        "https://example.com/boekhouden",
        "<html><head><title>Boekhouden zonder gedoe</title></head><body><h1>Start</h1></body></html>",
    );

    let report = evaluate(&checklist.items, &page, builtin(), &EvaluationConfig::default());

    assert_eq!(report.results.len(), checklist.items.len());
    for (result, item) in report.results.iter().zip(&checklist.items) {
        assert_eq!(&result.item, item);
    }
    assert!(report.unlisted.is_empty());
    assert_eq!(
        report.summary.counts.decided() + report.summary.counts.review,
        report.results.len()
    );
}

#[test]
fn unmatched_tip_falls_back_to_manual_review() {
    let page = snapshot("https://example.com/", "<html></html>");
    let items = [item("Gebruik van schaduweffecten", Priority::Low)];

    let report = evaluate(&items, &page, builtin(), &EvaluationConfig::default());

    let result = &report.results[0];
    assert_eq!(result.verdict, Verdict::Review);
    assert_eq!(result.evidence, MANUAL_REVIEW_EVIDENCE);
    assert!(result.evidence.contains("manual review"));
    assert_eq!(result.match_kind, MatchKind::None);
    assert_eq!(report.summary.score, None);
    assert_eq!(report.summary.weighted_score, None);
}

#[test]
fn logical_url_with_query_clutter_warns() {
    let page = snapshot("example.com/product/sku-48291?ref=ab12", "<html></html>");
    let items = [item("Logische URL", Priority::High)];

    let report = evaluate(&items, &page, builtin(), &EvaluationConfig::default());

    let result = &report.results[0];
    assert_eq!(result.verdict, Verdict::Warn, "{}", result.evidence);
    assert_eq!(result.matched_checker_id.as_deref(), Some("logical_url"));
    assert_eq!(result.match_kind, MatchKind::Exact);
}

#[test]
fn favicon_without_resolving_resource_fails() {
    let page = snapshot(
        "https://example.com/",
        r#"<html><head><link rel="icon" href="/icon.png"></head></html>"#,
    );
    let items = [item("Favicon", Priority::Low)];

    let report = evaluate(&items, &page, builtin(), &EvaluationConfig::default());

    assert_eq!(report.results[0].verdict, Verdict::Fail);
}

#[test]
fn failing_checkers_degrade_to_review_without_affecting_neighbours() {
    let registry = faulty_registry();
    let page = snapshot("https://example.com/", "");
    let items = [
        item("Erroring", Priority::High),
        item("Steady", Priority::Medium),
        item("Panicking", Priority::High),
        item("Stalling", Priority::Low),
        item("Steady", Priority::Low),
    ];
    let config = EvaluationConfig {
        checker_budget_ms: 100,
        include_unlisted: false,
    };

    let report = evaluate(&items, &page, &registry, &config);

    let verdicts = report.results.iter().map(|r| r.verdict).collect::<Vec<_>>();
    assert_eq!(
        verdicts,
        vec![
            Verdict::Review,
            Verdict::Pass,
            Verdict::Review,
            Verdict::Review,
            Verdict::Pass
        ]
    );
    assert!(report.results[0].evidence.contains("`erroring`"));
    assert!(report.results[0].evidence.contains("selector blew up"));
    assert!(report.results[2].evidence.contains("checker exploded"));
    assert!(report.results[3].evidence.contains("exceeded its 100 ms budget"), "{}", report.results[3].evidence);
    for index in [0, 2, 3] {
        assert!(report.results[index].evidence.contains("manual review"));
    }
    assert_eq!(report.summary.score, Some(100.0));
}

#[test]
fn zero_budget_runs_inline_and_still_contains_panics() {
    let registry = faulty_registry();
    let page = snapshot("https://example.com/", "");
    let items = [item("Panicking", Priority::High), item("Steady", Priority::High)];
    let config = EvaluationConfig {
        checker_budget_ms: 0,
        include_unlisted: false,
    };

    let report = evaluate(&items, &page, &registry, &config);

    assert_eq!(report.results[0].verdict, Verdict::Review);
    assert_eq!(report.results[1].verdict, Verdict::Pass);
    assert_eq!(report.checker_budget_ms, 0);
}

#[test]
fn unlisted_checkers_run_separately_from_results() {
    let registry = faulty_registry();
    let page = snapshot("https://example.com/", "");
    let items = [item("Steady", Priority::High), item("Onbekend", Priority::High)];
    let config = EvaluationConfig {
        checker_budget_ms: 50,
        include_unlisted: true,
    };

    let report = evaluate(&items, &page, &registry, &config);

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.summary.score, Some(100.0));
    let unlisted = report
        .unlisted
        .iter()
        .map(|r| r.matched_checker_id.as_deref().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(unlisted, vec!["erroring", "panicking", "stalling"]);
    for result in &report.unlisted {
        assert_eq!(result.item.category, UNLISTED_CATEGORY);
        assert_eq!(result.match_kind, MatchKind::Unlisted);
    }
}

#[test]
fn score_follows_contribution_formula() {
    let results = [
        result_with(Verdict::Pass, Priority::High),
        result_with(Verdict::Warn, Priority::Medium),
        result_with(Verdict::Fail, Priority::Low),
        result_with(Verdict::Review, Priority::High),
    ];

    let summary = summarize(&results);

    assert_eq!(summary.counts.pass, 1);
    assert_eq!(summary.counts.review, 1);
    assert_eq!(summary.score, Some(50.0));
    // (3 * 1 + 2 * 0.5 + 1 * 0) / 6
    let weighted = summary.weighted_score.expect("decided items present");
    assert!((weighted - 400.0 / 6.0).abs() < 1e-9);
}

#[test]
fn fingerprint_tracks_item_order() {
    let page = snapshot("https://example.com/", "");
    let a = item("Favicon", Priority::Low);
    let b = item("Sticky CTA", Priority::High);
    let config = EvaluationConfig::default();

    let forward = evaluate(&[a.clone(), b.clone()], &page, builtin(), &config);
    let again = evaluate(&[a.clone(), b.clone()], &page, builtin(), &config);
    let reversed = evaluate(&[b, a], &page, builtin(), &config);

    assert_eq!(forward.checklist_sha256, again.checklist_sha256);
    assert_ne!(forward.checklist_sha256, reversed.checklist_sha256);
}

fn verdict_strategy() -> impl Strategy<Value = Verdict> {
    prop::sample::select(Verdict::ALL.to_vec())
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop::sample::select(vec![Priority::Low, Priority::Medium, Priority::High])
}

proptest! {
    #[test]
    fn score_is_bounded_and_undefined_only_without_decisions(
        entries in prop::collection::vec((verdict_strategy(), priority_strategy()), 0..40)
    ) {
        let results = entries
            .iter()
            .map(|(verdict, priority)| result_with(*verdict, *priority))
            .collect::<Vec<_>>();

        let summary = summarize(&results);
        let decided = summary.counts.decided();

        prop_assert_eq!(summary.score.is_none(), decided == 0);
        prop_assert_eq!(summary.weighted_score.is_none(), decided == 0);
        if let Some(score) = summary.score {
            prop_assert!((0.0..=100.0).contains(&score));
            let expected = (summary.counts.pass as f64 + 0.5 * summary.counts.warn as f64)
                / decided as f64
                * 100.0;
            prop_assert!((score - expected).abs() < 1e-9);
        }
        if let Some(weighted) = summary.weighted_score {
            prop_assert!((0.0..=100.0 + 1e-9).contains(&weighted));
        }
    }
}
