use crate::engine::registry::{CheckOutcome, CheckerSpec};
use crate::error::CheckerError;
use crate::html::{condense_whitespace, element_inner, find_elements, find_tags, strip_tags};
use crate::model::PageSnapshot;
use crate::util::truncate_chars;

const TITLE_CHARS: std::ops::RangeInclusive<usize> = 10..=65;
const DESCRIPTION_CHARS: std::ops::RangeInclusive<usize> = 50..=160;

pub(super) fn specs() -> Vec<CheckerSpec> {
    vec![
        CheckerSpec {
            id: "title_length",
            name: "Title length 10-65",
            match_keys: &["paginatitel", "page title", "title tag", "titel tag", "title length"],
            run: check_title_length,
        },
        CheckerSpec {
            id: "meta_description",
            name: "Meta description 50-160",
            match_keys: &["meta description", "metabeschrijving", "meta beschrijving"],
            run: check_meta_description,
        },
        CheckerSpec {
            id: "primary_heading",
            name: "H1 present",
            match_keys: &["h1", "hoofdkop", "main heading", "primary heading"],
            run: check_primary_heading,
        },
        CheckerSpec {
            id: "canonical_link",
            name: "Canonical link",
            match_keys: &["canonical", "canonical link", "canonieke url", "canonical url"],
            run: check_canonical_link,
        },
    ]
}

fn check_title_length(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let Some(raw) = element_inner(&snapshot.html, "title")?.into_iter().next() else {
        return Ok(CheckOutcome::fail("no <title> element"));
    };
    let title = strip_tags(&raw)?;
    let length = title.chars().count();
    if length == 0 {
        return Ok(CheckOutcome::fail("<title> is empty"));
    }

    let evidence = format!("{length} chars: {}", truncate_chars(&title, 120));
    Ok(if TITLE_CHARS.contains(&length) {
        CheckOutcome::pass(evidence)
    } else {
        CheckOutcome::warn(evidence)
    })
}

fn check_meta_description(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let description = find_tags(&snapshot.html, "meta")?
        .into_iter()
        .find(|tag| tag.attr_lower("name") == "description")
        .map(|tag| condense_whitespace(tag.attr("content").unwrap_or_default()))
        .unwrap_or_default();
    if description.is_empty() {
        return Ok(CheckOutcome::fail("no meta description found"));
    }

    let length = description.chars().count();
    let evidence = format!("{length} chars: {}", truncate_chars(&description, 160));
    Ok(if DESCRIPTION_CHARS.contains(&length) {
        CheckOutcome::pass(evidence)
    } else {
        CheckOutcome::warn(evidence)
    })
}

fn check_primary_heading(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let count = find_tags(&snapshot.html, "h1")?.len();
    let texts = find_elements(&snapshot.html, "h1")?
        .iter()
        .take(3)
        .map(|element| strip_tags(&element.inner).map(|text| truncate_chars(&text, 60)))
        .collect::<Result<Vec<String>, regex::Error>>()?;

    Ok(match count {
        0 => CheckOutcome::fail("no <h1> found"),
        1 => CheckOutcome::pass(format!("one <h1>: {texts:?}")),
        n => CheckOutcome::warn(format!("{n} <h1> elements compete for attention: {texts:?}")),
    })
}

fn check_canonical_link(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let canonical = find_tags(&snapshot.html, "link")?.into_iter().find(|tag| {
        tag.attr_lower("rel")
            .split_whitespace()
            .any(|token| token == "canonical")
    });

    Ok(match canonical {
        Some(tag) => CheckOutcome::pass(format!(
            "canonical -> {}",
            tag.attr("href").unwrap_or_default()
        )),
        None => CheckOutcome::warn("no <link rel=\"canonical\"> (optional)"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::checkers::snapshot_with_html;
    use crate::model::Verdict;

    fn verdict(check: fn(&PageSnapshot) -> Result<CheckOutcome, CheckerError>, html: &str) -> Verdict {
        check(&snapshot_with_html("https://example.com/", html))
            .expect("checker runs")
            .verdict
    }

    #[test]
    fn title_length_bands() {
        assert_eq!(verdict(check_title_length, "<title>Boekhouden zonder gedoe | Acme</title>"), Verdict::Pass);
        assert_eq!(verdict(check_title_length, "<title>Home</title>"), Verdict::Warn);
        assert_eq!(verdict(check_title_length, "<title>  </title>"), Verdict::Fail);
        assert_eq!(verdict(check_title_length, "<head></head>"), Verdict::Fail);
    }

    #[test]
    fn meta_description_bands() {
        let good = format!(r#"<meta name="description" content="{}">"#, "a".repeat(120));
        assert_eq!(verdict(check_meta_description, &good), Verdict::Pass);
        assert_eq!(
            verdict(check_meta_description, r#"<meta name="Description" content="Te kort">"#),
            Verdict::Warn
        );
        assert_eq!(verdict(check_meta_description, "<meta charset=utf-8>"), Verdict::Fail);
    }

    #[test]
    fn primary_heading_counts() {
        assert_eq!(verdict(check_primary_heading, "<h2>x</h2>"), Verdict::Fail);
        assert_eq!(verdict(check_primary_heading, "<h1>Een</h1>"), Verdict::Pass);
        assert_eq!(verdict(check_primary_heading, "<h1>Een</h1><H1>Twee</H1>"), Verdict::Warn);
    }

    #[test]
    fn canonical_link_is_optional() {
        assert_eq!(
            verdict(check_canonical_link, r#"<link rel="canonical" href="https://example.com/">"#),
            Verdict::Pass
        );
        assert_eq!(verdict(check_canonical_link, r#"<link rel="stylesheet" href="/a.css">"#), Verdict::Warn);
    }
}
