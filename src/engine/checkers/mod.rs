//! Built-in automated checkers.
//!
//! Every checker is a plain function over a [`PageSnapshot`] and never performs
//! I/O; whatever a check needs (favicon probes, headers, timing) is gathered by
//! the fetcher beforehand. Missing page features yield WARN or FAIL; a checker
//! only returns an error when it cannot judge the page at all.
//!
//! [`PageSnapshot`]: crate::model::PageSnapshot

mod content;
mod favicon;
mod fold;
mod mobile;
mod seo;
mod transport;
mod url;

use super::registry::CheckerSpec;

pub fn builtin_specs() -> Vec<CheckerSpec> {
    let mut specs = Vec::new();
    specs.extend(url::specs());
    specs.extend(mobile::specs());
    specs.extend(favicon::specs());
    specs.extend(fold::specs());
    specs.extend(seo::specs());
    specs.extend(content::specs());
    specs.extend(transport::specs());
    specs
}

#[cfg(test)]
pub(crate) fn snapshot_with_html(final_url: &str, html: &str) -> crate::model::PageSnapshot {
    crate::model::PageSnapshot {
        requested_url: final_url.to_string(),
        final_url: final_url.to_string(),
        status_code: 200,
        html: html.to_string(),
        ..Default::default()
    }
}
