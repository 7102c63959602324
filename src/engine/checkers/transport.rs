use crate::engine::registry::{CheckOutcome, CheckerSpec};
use crate::error::CheckerError;
use crate::html::parse_page_url;
use crate::model::PageSnapshot;

const FAST_MS: u64 = 1_500;
const ACCEPTABLE_MS: u64 = 4_000;
const LIGHT_BYTES: usize = 1024 * 1024;
const ACCEPTABLE_BYTES: usize = 3 * 1024 * 1024;

pub(super) fn specs() -> Vec<CheckerSpec> {
    vec![
        CheckerSpec {
            id: "https",
            name: "Secure connection (HTTPS)",
            match_keys: &[
                "https",
                "ssl",
                "ssl certificaat",
                "beveiligde verbinding",
                "secure connection",
            ],
            run: check_https,
        },
        CheckerSpec {
            id: "page_speed",
            name: "Page load speed",
            match_keys: &[
                "laadsnelheid van pagina",
                "laadsnelheid",
                "paginasnelheid",
                "page speed",
                "page load speed",
            ],
            run: check_page_speed,
        },
    ]
}

fn check_https(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let url = parse_page_url(&snapshot.final_url).ok_or_else(|| {
        CheckerError::Internal(format!("final url is not parseable: {}", snapshot.final_url))
    })?;

    if url.scheme() != "https" {
        return Ok(CheckOutcome::fail(format!(
            "final url is served over {}",
            url.scheme()
        )));
    }

    Ok(match snapshot.header("strict-transport-security") {
        Some(policy) => CheckOutcome::pass(format!("https with HSTS `{policy}`")),
        None => CheckOutcome::warn("https without a strict-transport-security header"),
    })
}

/// Judges the document fetch only; sub-resources are not loaded.
fn check_page_speed(snapshot: &PageSnapshot) -> Result<CheckOutcome, CheckerError> {
    let timing = snapshot.timing;
    let evidence = format!(
        "document fetched in {} ms, {} KiB (sub-resources not measured)",
        timing.elapsed_ms,
        timing.body_bytes / 1024
    );

    Ok(
        if timing.elapsed_ms <= FAST_MS && timing.body_bytes <= LIGHT_BYTES {
            CheckOutcome::pass(evidence)
        } else if timing.elapsed_ms <= ACCEPTABLE_MS && timing.body_bytes <= ACCEPTABLE_BYTES {
            CheckOutcome::warn(evidence)
        } else {
            CheckOutcome::fail(evidence)
        },
    )
}
