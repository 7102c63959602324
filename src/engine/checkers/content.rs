use crate::engine::registry::{CheckOutcome, CheckerSpec};
use crate::error::CheckerError;
use crate::html::{element_inner, find_tags};
use crate::model::PageSnapshot;

const TRACKER_SIGNATURES: [&str; 6] = [
    "gtag(",
    "googletagmanager.com",
    "fbq(",
    "clarity(",
    "hotjar",
    "datalayer",
];

/// Input types that never need a visible label.
const UNLABELLED_INPUT_TYPES: [&str; 5] = ["hidden", "submit", "button", "image", "reset"];

pub(super) fn specs() -> Vec<CheckerSpec> {
    vec![
        CheckerSpec {
            id: "image_alt_text",
            name: "Image alts coverage",
            match_keys: &[
                "alt tekst",
                "alt-tekst",
                "alt teksten",
                "alt text",
                "image alt",
                "alt-attributen",
            ],
            run: check_image_alt_text,
        },
        CheckerSpec {
            id: "form_labels",
            name: "Forms & labels present",
            match_keys: &[
                "formulierlabels",
                "form labels",
                "labels bij formulieren",
                "formulier labels",
            ],
            run: check_form_labels,
        },
        CheckerSpec {
            id: "analytics_tracking",
            name: "Analytics/trust snippet",
            match_keys: &[
                "analytics",
                "conversietracking",
                "conversion tracking",
                "tracking pixel",
                "webanalyse",
            ],
            run: check_analytics_tracking,
        },
    ]
}

fn check_image_alt_text(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let images = find_tags(&snapshot.html, "img")?;
    if images.is_empty() {
        return Ok(CheckOutcome::pass("no <img> tags"));
    }

    let total = images.len();
    let with_alt = images
        .iter()
        .filter(|tag| !tag.attr("alt").unwrap_or_default().trim().is_empty())
        .count();
    let pct = with_alt as f64 / total as f64 * 100.0;
    let evidence = format!("{with_alt}/{total} ({pct:.0}%) have alt text");

    Ok(if pct >= 80.0 {
        CheckOutcome::pass(evidence)
    } else if pct >= 50.0 {
        CheckOutcome::warn(evidence)
    } else {
        CheckOutcome::fail(evidence)
    })
}

fn check_form_labels(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let html = &snapshot.html;
    let forms = find_tags(html, "form")?.len();

    let mut fields = find_tags(html, "input")?
        .into_iter()
        .filter(|tag| !UNLABELLED_INPUT_TYPES.contains(&tag.attr_lower("type").as_str()))
        .collect::<Vec<_>>();
    fields.extend(find_tags(html, "textarea")?);
    fields.extend(find_tags(html, "select")?);

    if forms == 0 || fields.is_empty() {
        return Ok(CheckOutcome::warn(format!(
            "no forms/inputs detected (forms={forms}, inputs={})",
            fields.len()
        )));
    }

    let labels = find_tags(html, "label")?.len();
    let aria_labelled = fields
        .iter()
        .filter(|tag| tag.has_attr("aria-label") || tag.has_attr("aria-labelledby"))
        .count();
    let labelled = labels + aria_labelled;
    let required = (fields.len() / 3).max(1);
    let evidence = format!(
        "forms={forms}, inputs={}, labels={labels}, aria-labelled={aria_labelled}",
        fields.len()
    );

    Ok(if labelled >= required {
        CheckOutcome::pass(evidence)
    } else {
        CheckOutcome::warn(evidence)
    })
}

fn check_analytics_tracking(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let mut scripts = find_tags(&snapshot.html, "script")?
        .iter()
        .filter_map(|tag| tag.attr("src").map(str::to_lowercase))
        .collect::<Vec<String>>();
    scripts.extend(
        element_inner(&snapshot.html, "script")?
            .iter()
            .map(|body| body.to_lowercase()),
    );
    let haystack = scripts.join("\n");

    let detected = TRACKER_SIGNATURES
        .iter()
        .filter(|signature| haystack.contains(*signature))
        .copied()
        .collect::<Vec<&str>>();

    Ok(if detected.is_empty() {
        CheckOutcome::warn(format!("no tracker detected in {} scripts", scripts.len()))
    } else {
        CheckOutcome::pass(format!("detected {}", detected.join(", ")))
    })
}
