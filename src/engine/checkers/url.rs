use regex::Regex;

use crate::engine::registry::{CheckOutcome, CheckerSpec};
use crate::error::CheckerError;
use crate::html::parse_page_url;
use crate::model::PageSnapshot;

const MAX_READABLE_PATH_CHARS: usize = 80;
const SESSION_MARKERS: [&str; 4] = ["jsessionid", "phpsessid", "sessionid", ";sid="];

pub(super) fn specs() -> Vec<CheckerSpec> {
    vec![CheckerSpec {
        id: "logical_url",
        name: "Logical, readable URL",
        match_keys: &[
            "logische url",
            "logical url",
            "leesbare url",
            "readable url",
            "logische, leesbare url",
        ],
        run: check_logical_url,
    }]
}

fn check_logical_url(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let url = parse_page_url(&snapshot.final_url).ok_or_else(|| {
        CheckerError::Internal(format!("final url is not parseable: {}", snapshot.final_url))
    })?;
    let uuid = Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")?;

    let path = url.path();
    let segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<&str>>();
    let query_pairs = url.query_pairs().count();
    let path_len = path.chars().count();

    let summary = format!(
        "path={} segments={} query_params={} path_len={}",
        path,
        segments.len(),
        query_pairs,
        path_len
    );

    if let Some(slug) = segments.last()
        && is_opaque_segment(slug, &uuid)
    {
        return Ok(CheckOutcome::fail(format!(
            "primary slug `{slug}` looks like an opaque identifier; {summary}"
        )));
    }

    let mut issues = Vec::new();
    if url.query().is_some_and(|query| !query.is_empty()) {
        issues.push(format!("query string clutter ({query_pairs} parameters)"));
    }
    if let Some(fragment) = url.fragment().filter(|fragment| !fragment.is_empty()) {
        issues.push(format!("fragment clutter (#{fragment})"));
    }
    let opaque_parents = segments
        .iter()
        .take(segments.len().saturating_sub(1))
        .filter(|segment| is_opaque_segment(segment, &uuid))
        .collect::<Vec<_>>();
    if !opaque_parents.is_empty() {
        issues.push(format!("opaque path segments {opaque_parents:?}"));
    }
    if path.chars().any(|c| c.is_uppercase()) {
        issues.push("upper-case characters".to_string());
    }
    if path.contains('_') {
        issues.push("underscores instead of hyphens".to_string());
    }
    if path.contains('%') {
        issues.push("percent-encoded characters".to_string());
    }
    if path_len > MAX_READABLE_PATH_CHARS {
        issues.push(format!("path longer than {MAX_READABLE_PATH_CHARS} characters"));
    }

    if issues.is_empty() {
        Ok(CheckOutcome::pass(format!("readable path; {summary}")))
    } else {
        Ok(CheckOutcome::warn(format!(
            "readable but {}; {summary}",
            issues.join(", ")
        )))
    }
}

/// IDs, hashes, session tokens and other segments a visitor cannot read.
fn is_opaque_segment(segment: &str, uuid: &Regex) -> bool {
    let lower = segment.to_ascii_lowercase();
    if SESSION_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return true;
    }

    let stem = match lower.rsplit_once('.') {
        Some((stem, extension))
            if !stem.is_empty()
                && extension.len() <= 5
                && extension.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => lower.as_str(),
    };
    if stem.is_empty() {
        return false;
    }
    if uuid.is_match(stem) {
        return true;
    }

    let digits = stem.chars().filter(char::is_ascii_digit).count();
    let letters = stem.chars().filter(char::is_ascii_alphabetic).count();

    if digits == stem.len() {
        let is_year = stem.len() == 4 && (stem.starts_with("19") || stem.starts_with("20"));
        return stem.len() >= 4 && !is_year;
    }
    if stem.len() >= 16 && digits > 0 && stem.chars().all(|c| c.is_ascii_hexdigit()) {
        return true;
    }
    if stem.len() >= 12 && !stem.contains('-') && digits >= 3 && letters >= 3 {
        return true;
    }

    stem.len() >= 4 && !has_letter_run(stem, 2)
}

fn has_letter_run(value: &str, min_run: usize) -> bool {
    let mut run = 0;
    for c in value.chars() {
        if c.is_alphabetic() {
            run += 1;
            if run >= min_run {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::checkers::snapshot_with_html;
    use crate::model::Verdict;

    fn verdict_for(url: &str) -> Verdict {
        check_logical_url(&snapshot_with_html(url, ""))
            .expect("checker runs")
            .verdict
    }

    #[test]
    fn readable_path_with_query_clutter_warns() {
        let outcome = check_logical_url(&snapshot_with_html(
            "example.com/product/sku-48291?ref=ab12",
            "",
        ))
        .expect("checker runs");
        assert_eq!(outcome.verdict, Verdict::Warn);
        assert!(outcome.evidence.contains("query string"), "{}", outcome.evidence);
    }

    #[test]
    fn clean_hyphenated_paths_pass() {
        assert_eq!(verdict_for("https://example.com/"), Verdict::Pass);
        assert_eq!(verdict_for("https://example.com/gratis-proefperiode"), Verdict::Pass);
        assert_eq!(verdict_for("https://example.com/blog/2024/nieuwe-collectie"), Verdict::Pass);
        assert_eq!(verdict_for("https://example.com/over-ons.html"), Verdict::Pass);
    }

    #[test]
    fn opaque_primary_slugs_fail() {
        assert_eq!(verdict_for("https://example.com/p/4829133"), Verdict::Fail);
        assert_eq!(
            verdict_for("https://example.com/lp/3f2b1c9e-8a7d-4e6f-9b0a-1c2d3e4f5a6b"),
            Verdict::Fail
        );
        assert_eq!(verdict_for("https://example.com/x9f3k2j8q7w1z"), Verdict::Fail);
        assert_eq!(verdict_for("https://example.com/shop;jsessionid=ABC123"), Verdict::Fail);
    }

    #[test]
    fn cosmetic_problems_warn() {
        assert_eq!(verdict_for("https://example.com/Landing_Page"), Verdict::Warn);
        assert_eq!(verdict_for("https://example.com/48291/aanbieding"), Verdict::Warn);
        assert_eq!(verdict_for("https://example.com/gratis-proefperiode#utm=ab12"), Verdict::Warn);
        assert_eq!(verdict_for("https://example.com/gratis-proefperiode#"), Verdict::Pass);
    }

    #[test]
    fn fragment_clutter_is_named_in_evidence() {
        let outcome = check_logical_url(&snapshot_with_html(
            "https://example.com/gratis-proefperiode#utm=ab12",
            "",
        ))
        .expect("checker runs");
        assert_eq!(outcome.verdict, Verdict::Warn);
        assert!(outcome.evidence.contains("fragment clutter (#utm=ab12)"), "{}", outcome.evidence);
    }

    #[test]
    fn unparseable_url_is_a_checker_error() {
        let err = check_logical_url(&snapshot_with_html("", "")).expect_err("no url");
        assert!(matches!(err, CheckerError::Internal(_)));
    }
}
