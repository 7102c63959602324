use crate::engine::registry::{CheckOutcome, CheckerSpec};
use crate::error::CheckerError;
use crate::html::{favicon_candidates, favicon_links};
use crate::model::PageSnapshot;

pub(super) fn specs() -> Vec<CheckerSpec> {
    vec![CheckerSpec {
        id: "favicon",
        name: "Favicon",
        match_keys: &["favicon", "favicon link", "site icon", "websitepictogram"],
        run: check_favicon,
    }]
}

fn check_favicon(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let declared = favicon_links(&snapshot.html)?.len();
    let candidates = favicon_candidates(&snapshot.final_url, &snapshot.html)?;

    if let Some(resolved) = candidates
        .iter()
        .find(|candidate| snapshot.resource_resolved(candidate))
    {
        return Ok(CheckOutcome::pass(format!(
            "favicon resolves at {resolved} ({declared} declared <link rel=icon>)"
        )));
    }

    let probed = candidates
        .iter()
        .map(|candidate| match snapshot.resources.get(candidate) {
            Some(Some(status)) => format!("{candidate} -> HTTP {status}"),
            Some(None) => format!("{candidate} -> unreachable"),
            None => format!("{candidate} -> not probed"),
        })
        .collect::<Vec<String>>();

    Ok(CheckOutcome::fail(format!(
        "no favicon resolved ({declared} declared <link rel=icon>); {}",
        if probed.is_empty() {
            "no candidates".to_string()
        } else {
            probed.join(", ")
        }
    )))
}
