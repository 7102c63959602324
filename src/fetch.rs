use std::collections::BTreeMap;
use std::error::Error as _;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{FetchError, FetchErrorKind};
use crate::html::favicon_candidates;
use crate::model::{PageSnapshot, Timing, Viewport};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; CRO-LP-Agent/1.0)";
const MAX_REDIRECTS: usize = 10;
const MAX_PROBE_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub viewport: Viewport,
    pub user_agent: String,
    /// Probe favicon candidates after the document is fetched.
    pub probe_resources: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            viewport: Viewport::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            probe_resources: true,
        }
    }
}

/// Fetches `url` into a fully materialized snapshot.
///
/// 4xx and 5xx documents are errors. Favicon probe failures are recorded in
/// `resources` as unreachable rather than raised.
pub fn fetch(url: &str, config: &FetchConfig) -> Result<PageSnapshot, FetchError> {
    let target = target_url(url)?;
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|err| FetchError::new(FetchErrorKind::Transport, url, error_chain(&err)))?;

    let started = Instant::now();
    let response = client
        .get(target.clone())
        .send()
        .map_err(|err| request_error(&err, url))?;

    let status = response.status().as_u16();
    if let Some(kind) = classify_status(status) {
        return Err(FetchError::new(
            kind,
            url,
            format!("{} answered HTTP {status}", response.url()),
        ));
    }

    let final_url = response.url().to_string();
    let headers = collect_headers(response.headers());
    let html = response.text().map_err(|err| request_error(&err, url))?;
    let timing = Timing {
        elapsed_ms: started.elapsed().as_millis() as u64,
        body_bytes: html.len(),
    };

    let resources = if config.probe_resources {
        probe_favicons(&client, &final_url, &html, config.timeout_secs)
    } else {
        BTreeMap::new()
    };

    info!(
        url = %target,
        final_url = %final_url,
        status,
        elapsed_ms = timing.elapsed_ms,
        body_bytes = timing.body_bytes,
        probed = resources.len(),
        "page fetched"
    );

    Ok(PageSnapshot {
        requested_url: url.to_string(),
        final_url,
        status_code: status,
        html,
        headers,
        viewport: config.viewport,
        timing,
        resources,
    })
}

/// Accepts `example.com/path` by assuming https; only http(s) is fetchable.
pub fn target_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::new(FetchErrorKind::InvalidUrl, raw, "empty url"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate)
        .map_err(|err| FetchError::new(FetchErrorKind::InvalidUrl, raw, err.to_string()))?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err(FetchError::new(
            FetchErrorKind::InvalidUrl,
            raw,
            "url has no host",
        )),
        other => Err(FetchError::new(
            FetchErrorKind::InvalidUrl,
            raw,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

pub fn classify_status(status: u16) -> Option<FetchErrorKind> {
    match status {
        200..=399 => None,
        400..=499 => Some(FetchErrorKind::Http4xx(status)),
        500..=599 => Some(FetchErrorKind::Http5xx(status)),
        _ => Some(FetchErrorKind::Transport),
    }
}

/// Classifies a transport failure from its flags and rendered source chain.
pub fn classify_failure(is_timeout: bool, is_builder: bool, chain: &str) -> FetchErrorKind {
    let chain = chain.to_ascii_lowercase();
    if is_timeout || chain.contains("timed out") {
        FetchErrorKind::Timeout
    } else if is_builder || chain.contains("relative url") || chain.contains("invalid url") {
        FetchErrorKind::InvalidUrl
    } else if ["dns error", "failed to lookup address", "name or service not known", "no such host"]
        .iter()
        .any(|marker| chain.contains(marker))
    {
        FetchErrorKind::Dns
    } else if ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|marker| chain.contains(marker))
    {
        FetchErrorKind::Tls
    } else {
        FetchErrorKind::Transport
    }
}

fn request_error(err: &reqwest::Error, url: &str) -> FetchError {
    let chain = error_chain(err);
    let kind = classify_failure(err.is_timeout(), err.is_builder(), &chain);
    FetchError::new(kind, url, chain)
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected = BTreeMap::<String, String>::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

fn probe_favicons(
    client: &Client,
    final_url: &str,
    html: &str,
    timeout_secs: u64,
) -> BTreeMap<String, Option<u16>> {
    let candidates = match favicon_candidates(final_url, html) {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!(error = %err, "favicon candidates could not be extracted");
            return BTreeMap::new();
        }
    };

    let probe_timeout = Duration::from_secs(timeout_secs.clamp(1, MAX_PROBE_SECS));
    candidates
        .into_iter()
        .map(|candidate| {
            let status = match client.get(candidate.as_str()).timeout(probe_timeout).send() {
                Ok(response) => Some(response.status().as_u16()),
                Err(err) => {
                    debug!(resource = %candidate, error = %err, "resource probe failed");
                    None
                }
            };
            (candidate, status)
        })
        .collect()
}
