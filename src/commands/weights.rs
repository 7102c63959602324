use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::WeightsArgs;
use crate::feedback::{FeedbackStore, tip_weight};

use super::emit;

#[derive(Debug, Serialize)]
struct WeightRow {
    tip_norm: String,
    n: u64,
    mean_reward: f64,
    weight: f64,
}

pub fn run(args: WeightsArgs) -> Result<()> {
    let store = FeedbackStore::open(&args.data_dir)?;
    let mut rows = store
        .tip_stats()?
        .into_iter()
        .map(|stat| WeightRow {
            weight: tip_weight(args.feedback_alpha, stat.n, stat.mean_reward),
            tip_norm: stat.tip_norm,
            n: stat.n,
            mean_reward: stat.mean_reward,
        })
        .collect::<Vec<WeightRow>>();
    rows.sort_by(|left, right| {
        right
            .weight
            .total_cmp(&left.weight)
            .then_with(|| left.tip_norm.cmp(&right.tip_norm))
    });

    let rendered = if args.json {
        serde_json::to_string_pretty(&rows).context("failed to serialize weights json")?
    } else if rows.is_empty() {
        "no feedback recorded yet".to_string()
    } else {
        rows.iter()
            .map(|row| {
                format!(
                    "{:+.3}\tn={}\tmean={:.3}\t{}",
                    row.weight, row.n, row.mean_reward, row.tip_norm
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    };
    emit(&rendered, None)
}
