use std::fmt::{self, Write as _};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{CheckResult, Report, Verdict, VerdictCounts};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub url: String,
    pub generated_at: String,
    pub score: Option<f64>,
    pub weighted_score: Option<f64>,
    pub counts: VerdictCounts,
    pub results: Vec<JsonResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unlisted: Vec<JsonResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonResult {
    pub category: String,
    pub tip: String,
    pub priority: String,
    pub difficulty: String,
    pub verdict: Verdict,
    pub evidence: String,
}

impl From<&CheckResult> for JsonResult {
    fn from(result: &CheckResult) -> Self {
        Self {
            category: result.item.category.clone(),
            tip: result.item.tip.clone(),
            priority: result.item.priority.as_str().to_string(),
            difficulty: result.item.difficulty.as_str().to_string(),
            verdict: result.verdict,
            evidence: result.evidence.clone(),
        }
    }
}

pub fn json_report(report: &Report) -> JsonReport {
    JsonReport {
        url: report.url.clone(),
        generated_at: report.generated_at.clone(),
        score: report.summary.score.map(round_one_decimal),
        weighted_score: report.summary.weighted_score.map(round_one_decimal),
        counts: report.summary.counts.clone(),
        results: report.results.iter().map(JsonResult::from).collect(),
        unlisted: report.unlisted.iter().map(JsonResult::from).collect(),
    }
}

pub fn to_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(&json_report(report)).context("failed to serialize report json")
}

/// Renders a score for humans; an undefined score is never shown as 0%.
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{score:.1}%"),
        None => "n/a".to_string(),
    }
}

/// Plain console summary, one line per item.
pub fn to_text(report: &Report) -> Result<String> {
    let mut out = String::new();
    let counts = &report.summary.counts;
    writeln!(out, "URL: {}", report.url)?;
    if report.final_url != report.url {
        writeln!(out, "Final URL: {}", report.final_url)?;
    }
    writeln!(
        out,
        "Score: {} (weighted {})",
        format_score(report.summary.score),
        format_score(report.summary.weighted_score)
    )?;
    let tally = Verdict::ALL
        .iter()
        .map(|verdict| format!("{verdict}={}", counts.get(*verdict)))
        .collect::<Vec<String>>();
    writeln!(out, "Counts: {}", tally.join(" "))?;

    for result in report.results.iter().chain(&report.unlisted) {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            result.verdict,
            result.item.category,
            result.item.tip,
            single_line(&result.evidence)
        )?;
    }
    Ok(out)
}

pub fn to_markdown(report: &Report) -> Result<String> {
    let mut out = String::new();
    let counts = &report.summary.counts;

    writeln!(out, "# CRO Landing Page Report\n")?;
    writeln!(out, "- URL: {}", report.url)?;
    if report.final_url != report.url {
        writeln!(out, "- Final URL: {}", report.final_url)?;
    }
    writeln!(out, "- Generated: {}", report.generated_at)?;
    writeln!(out, "- Score: {}", format_score(report.summary.score))?;
    writeln!(
        out,
        "- Weighted score: {}",
        format_score(report.summary.weighted_score)
    )?;
    writeln!(
        out,
        "- Counts: PASS {} · WARN {} · FAIL {} · REVIEW {}\n",
        counts.pass, counts.warn, counts.fail, counts.review
    )?;

    writeln!(out, "## Checks\n")?;
    for result in &report.results {
        write_markdown_result(&mut out, result)?;
    }

    if !report.unlisted.is_empty() {
        writeln!(out, "## Automated (extra)\n")?;
        for result in &report.unlisted {
            write_markdown_result(&mut out, result)?;
        }
    }
    Ok(out)
}

fn write_markdown_result(out: &mut String, result: &CheckResult) -> fmt::Result {
    let item = &result.item;
    writeln!(out, "### {}", single_line(&item.tip))?;
    writeln!(out, "- Category: {}", single_line(&item.category))?;
    writeln!(out, "- Verdict: **{}**", result.verdict)?;
    writeln!(out, "- Evidence: {}", single_line(&result.evidence))?;
    writeln!(
        out,
        "- Priority: {} · Difficulty: {}",
        item.priority.as_str(),
        item.difficulty.as_str()
    )?;
    if !item.explanation.trim().is_empty() {
        writeln!(out, "\n{}", item.explanation.trim())?;
    }
    out.push('\n');
    Ok(())
}

pub fn to_html(report: &Report) -> Result<String> {
    let mut out = String::new();
    let counts = &report.summary.counts;

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    writeln!(out, "<title>CRO report: {}</title>", escape_html(&report.url))?;
    out.push_str(
        "<style>body{font-family:Arial,sans-serif;padding:16px}table{border-collapse:collapse}\
         td,th{border:1px solid #ccc;padding:4px 8px;text-align:left;vertical-align:top}\
         .PASS{color:#1a7f37}.WARN{color:#9a6700}.FAIL{color:#cf222e}.REVIEW{color:#57606a}</style>\n",
    );
    out.push_str("</head>\n<body>\n<h1>CRO Landing Page Report</h1>\n<ul>\n");
    writeln!(out, "<li>URL: {}</li>", escape_html(&report.url))?;
    writeln!(out, "<li>Generated: {}</li>", escape_html(&report.generated_at))?;
    writeln!(out, "<li>Score: {}</li>", format_score(report.summary.score))?;
    writeln!(
        out,
        "<li>Weighted score: {}</li>",
        format_score(report.summary.weighted_score)
    )?;
    writeln!(
        out,
        "<li>Counts: PASS {} · WARN {} · FAIL {} · REVIEW {}</li>",
        counts.pass, counts.warn, counts.fail, counts.review
    )?;
    out.push_str("</ul>\n<h2>Checks</h2>\n");
    write_html_table(&mut out, &report.results)?;

    if !report.unlisted.is_empty() {
        out.push_str("<h2>Automated (extra)</h2>\n");
        write_html_table(&mut out, &report.unlisted)?;
    }
    out.push_str("</body>\n</html>\n");
    Ok(out)
}

fn write_html_table(out: &mut String, results: &[CheckResult]) -> fmt::Result {
    out.push_str(
        "<table>\n<tr><th>Category</th><th>Tip</th><th>Priority</th><th>Difficulty</th><th>Verdict</th><th>Evidence</th></tr>\n",
    );
    for result in results {
        let item = &result.item;
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{verdict}\">{verdict}</td><td>{}</td></tr>",
            escape_html(&item.category),
            escape_html(&item.tip),
            item.priority.as_str(),
            item.difficulty.as_str(),
            escape_html(&result.evidence),
            verdict = result.verdict,
        )?;
    }
    out.push_str("</table>\n");
    Ok(())
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
