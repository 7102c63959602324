use crate::engine::registry::{CheckOutcome, CheckerSpec};
use crate::error::CheckerError;
use crate::html::{Tag, body_markup, char_prefix, find_elements, find_tags, strip_tags};
use crate::model::PageSnapshot;
use crate::util::truncate_chars;

/// Markup characters after `<body>` treated as the first rendered screen.
const FOLD_MARKUP_CHARS: usize = 2000;

const CTA_WORDS: [&str; 14] = [
    "start",
    "gratis",
    "free",
    "try",
    "proef",
    "demo",
    "offerte",
    "aanvraag",
    "koop",
    "bestel",
    "aanmelden",
    "download",
    "inschrijven",
    "contact",
];

/// Buttons carrying these markers are page chrome, not calls to action.
const CHROME_MARKERS: [&str; 6] = ["menu", "toggle", "nav", "close", "search", "hamburger"];

pub(super) fn specs() -> Vec<CheckerSpec> {
    vec![CheckerSpec {
        id: "above_the_fold",
        name: "Above-the-fold content",
        match_keys: &[
            "inhoud boven de vouw",
            "boven de vouw",
            "above the fold content",
            "above the fold",
            "cta boven de vouw",
        ],
        run: check_above_the_fold,
    }]
}

fn check_above_the_fold(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let body = body_markup(&snapshot.html)?;
    let region = char_prefix(&body, FOLD_MARKUP_CHARS);

    let heading = match find_elements(region, "h1")?.first() {
        Some(element) => Some(strip_tags(&element.inner)?),
        None if !find_tags(region, "h1")?.is_empty() => Some(String::new()),
        None => None,
    };
    let cta = first_call_to_action(region)?;

    let describe = |value: &Option<String>| match value {
        Some(text) if !text.is_empty() => format!("`{}`", truncate_chars(text, 80)),
        Some(_) => "present".to_string(),
        None => "missing".to_string(),
    };
    let evidence = format!(
        "first {FOLD_MARKUP_CHARS} chars of body: h1 {}; call to action {}",
        describe(&heading),
        describe(&cta)
    );

    Ok(match (heading.is_some(), cta.is_some()) {
        (true, true) => CheckOutcome::pass(evidence),
        (false, false) => CheckOutcome::fail(evidence),
        _ => CheckOutcome::warn(evidence),
    })
}

/// Text of the first call-to-action element in `region`, if any.
fn first_call_to_action(region: &str) -> Result<Option<String>, CheckerError> {
    let mut candidates = Vec::<(usize, String)>::new();

    for element in find_elements(region, "a")? {
        let text = strip_tags(&element.inner)?;
        if is_cta_link(&element.tag, &text) {
            candidates.push((element.tag.start, text));
        }
    }
    for element in find_elements(region, "button")? {
        if !is_chrome(&element.tag) {
            candidates.push((element.tag.start, strip_tags(&element.inner)?));
        }
    }
    for tag in find_tags(region, "input")? {
        if matches!(tag.attr_lower("type").as_str(), "submit" | "button") && !is_chrome(&tag) {
            candidates.push((tag.start, tag.attr("value").unwrap_or_default().to_string()));
        }
    }

    Ok(candidates
        .into_iter()
        .min_by_key(|(start, _)| *start)
        .map(|(_, text)| text))
}

fn is_cta_link(tag: &Tag, text: &str) -> bool {
    let text = text.to_lowercase();
    let class = tag.attr_lower("class");
    let href = tag.attr_lower("href");

    tag.attr_lower("role") == "button"
        || class.contains("button")
        || class.contains("btn")
        || CTA_WORDS.iter().any(|word| text.contains(word))
        || href.starts_with("#contact")
        || href.starts_with("mailto:")
}

fn is_chrome(tag: &Tag) -> bool {
    let markers = format!(
        "{} {} {}",
        tag.attr_lower("class"),
        tag.attr_lower("id"),
        tag.attr_lower("aria-label")
    );
    CHROME_MARKERS.iter().any(|marker| markers.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::checkers::snapshot_with_html;
    use crate::model::Verdict;

    fn run(html: &str) -> CheckOutcome {
        check_above_the_fold(&snapshot_with_html("https://example.com/", html)).expect("checker runs")
    }

    #[test]
    fn heading_and_cta_near_top_pass() {
        let outcome = run(
            r#"<html><head><title>x</title></head><body><header><h1>Slimmer <em>plannen</em></h1>
            <a class="btn btn-primary" href="/signup">Probeer het</a></header></body></html>"#,
        );
        assert_eq!(outcome.verdict, Verdict::Pass);
        assert!(outcome.evidence.contains("Slimmer plannen"), "{}", outcome.evidence);
        assert!(outcome.evidence.contains("Probeer het"), "{}", outcome.evidence);
    }

    #[test]
    fn heading_without_cta_warns() {
        let outcome = run(
            r#"<body><button class="menu-toggle">Menu</button><h1>Welkom</h1><a href="/over">Over ons</a></body>"#,
        );
        assert_eq!(outcome.verdict, Verdict::Warn);
        assert!(outcome.evidence.contains("call to action missing"));
    }

    #[test]
    fn cta_by_wording_or_submit_input_is_detected() {
        assert_eq!(run(r#"<body><a href="/demo">Plan een demo</a></body>"#).verdict, Verdict::Warn);
        assert_eq!(
            run(r#"<body><h1>Hoi</h1><form><input type="submit" value="Verstuur"></form></body>"#).verdict,
            Verdict::Pass
        );
    }

    #[test]
    fn content_after_the_fold_region_is_ignored() {
        let filler = "<p>lorem ipsum</p>".repeat(200);
        let html = format!(r#"<body>{filler}<h1>Te laat</h1><a class="btn">Start</a></body>"#);
        assert_eq!(run(&html).verdict, Verdict::Fail);
    }
}
