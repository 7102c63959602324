use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::CheckersArgs;
use crate::engine::builtin;

use super::emit;

#[derive(Debug, Serialize)]
struct CheckerRow {
    id: &'static str,
    name: &'static str,
    match_keys: &'static [&'static str],
}

pub fn run(args: CheckersArgs) -> Result<()> {
    let registry = builtin();
    info!(
        checkers = registry.specs().len(),
        keys = registry.keys().count(),
        collisions = registry.collisions().len(),
        "registry loaded"
    );

    let rows = registry
        .specs()
        .iter()
        .map(|spec| CheckerRow {
            id: spec.id,
            name: spec.name,
            match_keys: spec.match_keys,
        })
        .collect::<Vec<CheckerRow>>();

    let rendered = if args.json {
        serde_json::to_string_pretty(&rows).context("failed to serialize checker json")?
    } else {
        rows.iter()
            .map(|row| format!("{}\t{}\t{}", row.id, row.name, row.match_keys.join(" | ")))
            .collect::<Vec<String>>()
            .join("\n")
    };
    emit(&rendered, None)
}
