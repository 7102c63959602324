use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::ChecklistSourceArgs;
use crate::engine::checklist::{Checklist, load_default, load_path};
use crate::error::SchemaError;
use crate::util::write_text_file;

pub mod analyze;
pub mod checkers;
pub mod checklist;
pub mod feedback;
pub mod weights;

/// Loads the requested checklist, or the bundled one when none is given.
///
/// A malformed user checklist is fatal unless `--fallback-to-default` is set.
pub fn load_checklist(source: &ChecklistSourceArgs) -> Result<Checklist> {
    let Some(path) = source.checklist.as_deref() else {
        return load_default().context("bundled checklist is invalid");
    };

    match load_path(path) {
        Ok(loaded) => {
            info!(path = %path.display(), items = loaded.items.len(), "using checklist file");
            Ok(loaded)
        }
        Err(err) if source.fallback_to_default && err.downcast_ref::<SchemaError>().is_some() => {
            warn!(
                path = %path.display(),
                error = %err,
                "checklist rejected; falling back to bundled checklist"
            );
            load_default().context("bundled checklist is invalid")
        }
        Err(err) => Err(err),
    }
}

/// Writes rendered output to `path`, or to stdout when no path is given.
pub fn emit(rendered: &str, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        write_text_file(path, rendered)?;
        info!(path = %path.display(), bytes = rendered.len(), "output written");
        return Ok(());
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    output.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        writeln!(output)?;
    }
    output.flush()?;
    Ok(())
}
