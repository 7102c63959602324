use anyhow::Result;

use crate::cli::FeedbackArgs;
use crate::feedback::{FeedbackStore, event_from_report_json, store_path};
use crate::util::read_text_file;

use super::emit;

pub fn run(args: FeedbackArgs) -> Result<()> {
    let raw = read_text_file(&args.report)?;
    let event = event_from_report_json(&raw, args.reward)?;

    let mut store = FeedbackStore::open(&args.data_dir)?;
    let updated = store.record(&event)?;
    let events = store.event_count()?;

    emit(
        &format!(
            "recorded reward {} for {} tips of {} ({} events in {})",
            event.reward,
            updated,
            event.url,
            events,
            store_path(&args.data_dir).display()
        ),
        None,
    )
}
