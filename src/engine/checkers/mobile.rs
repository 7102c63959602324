use regex::Regex;

use crate::engine::registry::{CheckOutcome, CheckerSpec};
use crate::error::CheckerError;
use crate::html::{element_inner, find_tags};
use crate::model::PageSnapshot;

const MAX_REPORTED_WIDTHS: usize = 3;

pub(super) fn specs() -> Vec<CheckerSpec> {
    vec![CheckerSpec {
        id: "mobile_responsiveness",
        name: "Mobile responsiveness",
        match_keys: &[
            "mobiele responsiviteit",
            "mobile responsiveness",
            "responsive design",
            "responsief ontwerp",
            "mobielvriendelijk",
            "mobile friendly",
        ],
        run: check_mobile_responsiveness,
    }]
}

fn check_mobile_responsiveness(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let viewport = find_tags(&snapshot.html, "meta")?
        .into_iter()
        .find(|tag| tag.attr_lower("name") == "viewport");
    let Some(viewport) = viewport else {
        return Ok(CheckOutcome::fail("no <meta name=\"viewport\"> directive"));
    };

    let content = viewport
        .attr_lower("content")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();
    let mut issues = Vec::new();
    if !content.contains("width=device-width") {
        issues.push(format!("viewport `{content}` does not use width=device-width"));
    }

    let wide = fixed_widths_beyond(&snapshot.html, snapshot.viewport.width)?;
    if !wide.is_empty() {
        let shown = wide
            .iter()
            .take(MAX_REPORTED_WIDTHS)
            .cloned()
            .collect::<Vec<String>>();
        issues.push(format!(
            "{} fixed widths wider than the {}px viewport ({})",
            wide.len(),
            snapshot.viewport.width,
            shown.join(", ")
        ));
    }

    if issues.is_empty() {
        Ok(CheckOutcome::pass(format!(
            "viewport `{content}`; no fixed widths beyond {}px",
            snapshot.viewport.width
        )))
    } else {
        Ok(CheckOutcome::warn(issues.join("; ")))
    }
}

/// Fixed `width`/`min-width` declarations and `width=` attributes wider than `limit` px.
/// Media-query conditions are ignored; they describe breakpoints, not layout.
fn fixed_widths_beyond(html: &str, limit: u32) -> Result<Vec<String>, CheckerError> {
    let media = Regex::new(r"(?i)@(media|container)[^{]*\{")?;
    let inline_style = Regex::new(r#"(?is)\sstyle\s*=\s*("[^"]*"|'[^']*')"#)?;
    let declaration = Regex::new(r"(?i)(?:^|[^-a-z])((?:min-)?width)\s*:\s*(\d{2,5})(?:\.\d+)?px")?;
    let attribute = Regex::new(
        r#"(?i)<(?:table|div|body|center)\b[^>]*\swidth\s*=\s*["']?(\d{2,5})(?:px)?["'\s/>]"#,
    )?;

    let mut css = element_inner(html, "style")?.join("\n");
    for captures in inline_style.captures_iter(html) {
        if let Some(value) = captures.get(1) {
            css.push('\n');
            css.push_str(value.as_str());
        }
    }
    let css = media.replace_all(&css, "{");

    let mut found = Vec::new();
    for captures in declaration.captures_iter(&css) {
        let (Some(property), Some(value)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        if value.as_str().parse::<u32>().is_ok_and(|px| px > limit) {
            found.push(format!("{}: {}px", property.as_str().to_lowercase(), value.as_str()));
        }
    }
    for captures in attribute.captures_iter(html) {
        if let Some(value) = captures.get(1)
            && value.as_str().parse::<u32>().is_ok_and(|px| px > limit)
        {
            found.push(format!("width=\"{}\"", value.as_str()));
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::checkers::snapshot_with_html;
    use crate::model::Verdict;

    const VIEWPORT: &str = r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#;

    fn run(html: &str) -> CheckOutcome {
        check_mobile_responsiveness(&snapshot_with_html("https://example.com/", html))
            .expect("checker runs")
    }

    #[test]
    fn missing_viewport_fails() {
        assert_eq!(run("<html><head></head><body>hi</body></html>").verdict, Verdict::Fail);
    }

    #[test]
    fn device_width_viewport_with_fluid_layout_passes() {
        let html = format!(
            "<head>{VIEWPORT}<style>.wrap {{ max-width: 1200px; width: 100%; }} @media (min-width: 768px) {{ .col {{ width: 50%; }} }}</style></head>"
        );
        let outcome = run(&html);
        assert_eq!(outcome.verdict, Verdict::Pass, "{}", outcome.evidence);
    }

    #[test]
    fn fixed_widths_beyond_viewport_warn() {
        let html = format!(
            r#"<head>{VIEWPORT}<style>#page {{ width: 960px; }}</style></head><body><table width="1000"><tr><td>x</td></tr></table><div style="min-width:1280px">y</div></body>"#
        );
        let outcome = run(&html);
        assert_eq!(outcome.verdict, Verdict::Warn);
        assert!(outcome.evidence.contains("width: 960px"), "{}", outcome.evidence);
        assert!(outcome.evidence.contains("min-width: 1280px"), "{}", outcome.evidence);
        assert!(outcome.evidence.contains("width=\"1000\""), "{}", outcome.evidence);
    }

    #[test]
    fn fixed_viewport_width_warns() {
        let outcome = run(r#"<meta name="viewport" content="width=1024">"#);
        assert_eq!(outcome.verdict, Verdict::Warn);
        assert!(outcome.evidence.contains("width=1024"));
    }
}
