use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::engine::{EvaluationConfig, builtin, evaluate};
use crate::export::{format_score, to_html, to_json, to_markdown, to_text};
use crate::feedback::{FeedbackStore, prioritize};
use crate::fetch::{FetchConfig, fetch};
use crate::model::{Report, Viewport};

use super::{emit, load_checklist};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let checklist = load_checklist(&args.source)?;
    info!(
        items = checklist.items.len(),
        checklist_sha256 = %checklist.sha256,
        "checklist loaded for analysis"
    );
    let mut items = checklist.items;

    if args.prioritize {
        let store = FeedbackStore::open(&args.data_dir)?;
        let weights = store.tip_weights(args.feedback_alpha)?;
        items = prioritize(items, &weights);
        info!(
            learned_tips = weights.len(),
            alpha = args.feedback_alpha,
            "checklist reordered by learned weights"
        );
    }

    let fetch_config = FetchConfig {
        timeout_secs: args.timeout_secs,
        viewport: Viewport {
            width: args.viewport_width,
            height: args.viewport_height,
        },
        ..FetchConfig::default()
    };
    let snapshot = fetch(&args.url, &fetch_config).context("page fetch failed")?;

    let config = EvaluationConfig {
        checker_budget_ms: args.checker_budget_ms,
        include_unlisted: args.include_unlisted,
    };
    let report = evaluate(&items, &Arc::new(snapshot), builtin(), &config);

    info!(
        url = %report.final_url,
        score = %format_score(report.summary.score),
        weighted_score = %format_score(report.summary.weighted_score),
        format = args.format.as_str(),
        "analysis complete"
    );

    let rendered = render(&report, args.format)?;
    emit(&rendered, args.output.as_deref())
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => to_text(report),
        OutputFormat::Markdown => to_markdown(report),
        OutputFormat::Html => to_html(report),
        OutputFormat::Json => to_json(report),
    }
    .with_context(|| format!("failed to render {} report", format.as_str()))
}
