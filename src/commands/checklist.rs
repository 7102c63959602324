use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ChecklistArgs;
use crate::engine::builtin;
use crate::engine::matcher::resolve;
use crate::model::{CheckItem, MatchKind};

use super::{emit, load_checklist};

#[derive(Debug, Serialize)]
struct ResolvedItem<'a> {
    source_row: usize,
    category: &'a str,
    tip: &'a str,
    priority: &'static str,
    difficulty: &'static str,
    checker_id: Option<&'static str>,
    matched_key: Option<&'a str>,
    match_kind: MatchKind,
}

pub fn run(args: ChecklistArgs) -> Result<()> {
    let checklist = load_checklist(&args.source)?;
    let registry = builtin();

    let rows = checklist
        .items
        .iter()
        .map(|item| {
            let resolution = resolve(&item.tip, registry);
            ResolvedItem {
                source_row: item.source_row,
                category: &item.category,
                tip: &item.tip,
                priority: item.priority.as_str(),
                difficulty: item.difficulty.as_str(),
                checker_id: resolution.map(|found| found.spec.id),
                matched_key: resolution.map(|found| found.matched_key),
                match_kind: resolution.map_or(MatchKind::None, |found| found.kind),
            }
        })
        .collect::<Vec<ResolvedItem<'_>>>();

    let automated = rows.iter().filter(|row| row.checker_id.is_some()).count();
    info!(
        items = rows.len(),
        automated,
        manual = rows.len() - automated,
        skipped_rows = checklist.skipped_rows.len(),
        coerced_cells = checklist.coerced_cells,
        sha256 = %checklist.sha256,
        "checklist resolved"
    );

    let rendered = if args.json {
        serde_json::to_string_pretty(&rows).context("failed to serialize checklist json")?
    } else {
        render_text(&checklist.items, &rows)
    };
    emit(&rendered, None)
}

fn render_text(items: &[CheckItem], rows: &[ResolvedItem<'_>]) -> String {
    let mut lines = Vec::with_capacity(rows.len());
    for (item, row) in items.iter().zip(rows) {
        let checker = match (row.checker_id, row.matched_key) {
            (Some(id), Some(key)) => format!("{id} ({} on '{key}')", row.match_kind.as_str()),
            _ => "manual review".to_string(),
        };
        lines.push(format!(
            "{}\t{}\t{}\t{}\t{}",
            item.source_row,
            item.priority.as_str(),
            item.category,
            item.tip,
            checker
        ));
    }
    lines.join("\n")
}
