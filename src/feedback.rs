use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::normalize::normalize_key;
use crate::export::JsonReport;
use crate::model::CheckItem;
use crate::util::{ensure_directory, now_utc_string, sha256_hex};

const DB_SCHEMA_VERSION: &str = "1";
pub const FEEDBACK_DB_FILENAME: &str = "feedback.sqlite";
/// Sample count after which a tip's mean reward carries full weight.
const FULL_WEIGHT_SAMPLES: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEvent {
    pub url: String,
    pub reward: f64,
    pub report_sha256: String,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TipStat {
    pub tip_norm: String,
    pub n: u64,
    pub mean_reward: f64,
}

pub struct FeedbackStore {
    connection: Connection,
}

pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(FEEDBACK_DB_FILENAME)
}

impl FeedbackStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        ensure_directory(data_dir)?;
        let db_path = store_path(data_dir);
        let connection = Connection::open(&db_path)
            .with_context(|| format!("failed to open feedback store {}", db_path.display()))?;
        configure_connection(&connection)?;
        Self::with_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory feedback store")?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Stores the event and folds its reward into the running mean of every
    /// distinct normalized tip it mentions. Returns the number of tips updated.
    pub fn record(&mut self, event: &FeedbackEvent) -> Result<usize> {
        if !event.reward.is_finite() {
            bail!("reward must be a finite number, got {}", event.reward);
        }

        let tips = event
            .tips
            .iter()
            .map(|tip| normalize_key(tip))
            .filter(|tip| !tip.is_empty())
            .collect::<BTreeSet<String>>();
        let recorded_at = now_utc_string();

        let tx = self
            .connection
            .transaction()
            .context("failed to start feedback transaction")?;
        tx.execute(
            "INSERT INTO feedback_events(recorded_at, url, reward, report_sha256, tip_count)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                recorded_at,
                event.url,
                event.reward,
                event.report_sha256,
                tips.len() as i64
            ],
        )
        .context("failed to insert feedback event")?;

        for tip in &tips {
            let current = tx
                .query_row(
                    "SELECT n, mean_reward FROM tip_stats WHERE tip_norm = ?1",
                    params![tip],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)),
                )
                .optional()
                .with_context(|| format!("failed to read tip stats for '{tip}'"))?;

            let (n, mean) = current.unwrap_or((0, 0.0));
            let n = n + 1;
            let mean = mean + (event.reward - mean) / n as f64;
            tx.execute(
                "INSERT INTO tip_stats(tip_norm, n, mean_reward, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(tip_norm) DO UPDATE SET
                   n = excluded.n,
                   mean_reward = excluded.mean_reward,
                   updated_at = excluded.updated_at",
                params![tip, n, mean, recorded_at],
            )
            .with_context(|| format!("failed to update tip stats for '{tip}'"))?;
            debug!(tip = %tip, n, mean_reward = mean, "tip stats updated");
        }

        tx.commit().context("failed to commit feedback event")?;
        info!(
            url = %event.url,
            reward = event.reward,
            tips = tips.len(),
            "feedback recorded"
        );
        Ok(tips.len())
    }

    pub fn event_count(&self) -> Result<u64> {
        let count = self
            .connection
            .query_row("SELECT COUNT(*) FROM feedback_events", [], |row| {
                row.get::<_, i64>(0)
            })
            .context("failed to count feedback events")?;
        Ok(count.max(0) as u64)
    }

    pub fn tip_stats(&self) -> Result<Vec<TipStat>> {
        let mut statement = self
            .connection
            .prepare("SELECT tip_norm, n, mean_reward FROM tip_stats ORDER BY tip_norm ASC")
            .context("failed to prepare tip stats query")?;
        let rows = statement
            .query_map([], |row| {
                Ok(TipStat {
                    tip_norm: row.get(0)?,
                    n: row.get::<_, i64>(1)?.max(0) as u64,
                    mean_reward: row.get(2)?,
                })
            })
            .context("failed to query tip stats")?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row.context("failed to decode tip stats row")?);
        }
        Ok(stats)
    }

    /// `alpha × min(1, n/10) × mean_reward` per normalized tip.
    pub fn tip_weights(&self, alpha: f64) -> Result<BTreeMap<String, f64>> {
        Ok(self
            .tip_stats()?
            .into_iter()
            .map(|stat| {
                let weight = tip_weight(alpha, stat.n, stat.mean_reward);
                (stat.tip_norm, weight)
            })
            .collect())
    }
}

pub fn tip_weight(alpha: f64, n: u64, mean_reward: f64) -> f64 {
    let shrink = (n as f64 / FULL_WEIGHT_SAMPLES).min(1.0);
    alpha * shrink * mean_reward
}

/// Stable reorder by `priority rank − learned weight`; unknown tips weigh 0.
pub fn prioritize(mut items: Vec<CheckItem>, weights: &BTreeMap<String, f64>) -> Vec<CheckItem> {
    let sort_key = |item: &CheckItem| {
        let weight = weights
            .get(&normalize_key(&item.tip))
            .copied()
            .unwrap_or(0.0);
        item.priority.rank() - weight
    };
    items.sort_by(|left, right| sort_key(left).total_cmp(&sort_key(right)));
    items
}

/// Builds a feedback event from an exported JSON report.
pub fn event_from_report_json(raw: &str, reward: f64) -> Result<FeedbackEvent> {
    let report: JsonReport =
        serde_json::from_str(raw).context("failed to parse report json")?;
    Ok(FeedbackEvent {
        url: report.url,
        reward,
        report_sha256: sha256_hex(raw.as_bytes()),
        tips: report.results.into_iter().map(|result| result.tip).collect(),
    })
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS feedback_events (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              recorded_at TEXT NOT NULL,
              url TEXT NOT NULL,
              reward REAL NOT NULL,
              report_sha256 TEXT NOT NULL,
              tip_count INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tip_stats (
              tip_norm TEXT PRIMARY KEY,
              n INTEGER NOT NULL,
              mean_reward REAL NOT NULL,
              updated_at TEXT NOT NULL
            );
            ",
        )
        .context("failed to create feedback schema")?;

    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES ('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to write feedback schema version")?;
    Ok(())
}
