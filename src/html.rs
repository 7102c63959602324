//! Lightweight markup scanning over raw HTML.
//!
//! Pages are inspected with linear-time regular expressions rather than a DOM;
//! the checks only need tag attributes, a few element texts and byte offsets.

use regex::Regex;
use url::Url;

pub const DEFAULT_FAVICON_PATH: &str = "/favicon.ico";
const MAX_FAVICON_LINKS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub attrs: Vec<(String, String)>,
    /// Byte offset of `<` in the scanned markup.
    pub start: usize,
}

impl Tag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    pub fn attr_lower(&self, name: &str) -> String {
        self.attr(name).unwrap_or_default().trim().to_lowercase()
    }
}

/// Opening tags named `name` (case-insensitive), in document order.
pub fn find_tags(markup: &str, name: &str) -> Result<Vec<Tag>, regex::Error> {
    let pattern = Regex::new(&format!(r"(?is)<{}(?:\s([^>]*))?/?>", regex::escape(name)))?;
    let attr_pattern = attribute_pattern()?;

    Ok(pattern
        .captures_iter(markup)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let raw = captures.get(1).map(|m| m.as_str()).unwrap_or("");
            Some(Tag {
                attrs: parse_attributes(raw, &attr_pattern),
                start: whole.start(),
            })
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub inner: String,
}

/// Complete `<name …>…</name>` elements; nested elements of the same name are not paired.
pub fn find_elements(markup: &str, name: &str) -> Result<Vec<Element>, regex::Error> {
    let escaped = regex::escape(name);
    let pattern = Regex::new(&format!(r"(?is)<{escaped}(?:\s([^>]*))?>(.*?)</{escaped}\s*>"))?;
    let attr_pattern = attribute_pattern()?;

    Ok(pattern
        .captures_iter(markup)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let raw = captures.get(1).map(|m| m.as_str()).unwrap_or("");
            Some(Element {
                tag: Tag {
                    attrs: parse_attributes(raw, &attr_pattern),
                    start: whole.start(),
                },
                inner: captures.get(2).map(|m| m.as_str().to_string())?,
            })
        })
        .collect())
}

/// Inner markup of every `<name>…</name>` element.
pub fn element_inner(markup: &str, name: &str) -> Result<Vec<String>, regex::Error> {
    Ok(find_elements(markup, name)?
        .into_iter()
        .map(|element| element.inner)
        .collect())
}

/// Visible text of a fragment: scripts, styles and tags removed, whitespace condensed.
pub fn strip_tags(fragment: &str) -> Result<String, regex::Error> {
    let blocks = Regex::new(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)\s*>")?;
    let comments = Regex::new(r"(?s)<!--.*?-->")?;
    let tags = Regex::new(r"(?s)<[^>]*>")?;

    let without_blocks = blocks.replace_all(fragment, " ");
    let without_comments = comments.replace_all(&without_blocks, " ");
    let text = tags.replace_all(&without_comments, " ");
    Ok(condense_whitespace(&decode_entities(&text)))
}

/// Markup following the opening `<body>` tag, with comments removed.
pub fn body_markup(html: &str) -> Result<String, regex::Error> {
    let body = Regex::new(r"(?is)<body(?:\s[^>]*)?>")?;
    let comments = Regex::new(r"(?s)<!--.*?-->")?;
    let start = body.find(html).map(|m| m.end()).unwrap_or(0);
    Ok(comments.replace_all(&html[start..], "").into_owned())
}

/// Longest prefix of `value` holding at most `max_chars` characters.
pub fn char_prefix(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((offset, _)) => &value[..offset],
        None => value,
    }
}

pub fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Parses a page URL, tolerating a missing scheme (`example.com/path`).
pub fn parse_page_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => Some(url),
        _ => Url::parse(&format!("http://{trimmed}")).ok(),
    }
}

pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    let base = parse_page_url(base)?;
    base.join(href.trim()).ok().map(|url| url.to_string())
}

/// `href`s of `<link>` tags whose `rel` mentions an icon.
pub fn favicon_links(html: &str) -> Result<Vec<String>, regex::Error> {
    Ok(find_tags(html, "link")?
        .into_iter()
        .filter(|tag| tag.attr_lower("rel").contains("icon"))
        .filter_map(|tag| tag.attr("href").map(str::trim).map(ToOwned::to_owned))
        .filter(|href| !href.is_empty())
        .collect())
}

/// Absolute favicon URLs worth probing: declared links first, then the default path.
pub fn favicon_candidates(final_url: &str, html: &str) -> Result<Vec<String>, regex::Error> {
    let mut candidates = Vec::new();
    for href in favicon_links(html)? {
        if href.starts_with("data:") {
            continue;
        }
        if let Some(resolved) = resolve_href(final_url, &href)
            && !candidates.contains(&resolved)
        {
            candidates.push(resolved);
        }
        if candidates.len() >= MAX_FAVICON_LINKS {
            break;
        }
    }
    if let Some(default) = resolve_href(final_url, DEFAULT_FAVICON_PATH)
        && !candidates.contains(&default)
    {
        candidates.push(default);
    }
    Ok(candidates)
}

fn attribute_pattern() -> Result<Regex, regex::Error> {
    Regex::new(
        r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#,
    )
}

fn parse_attributes(raw: &str, pattern: &Regex) -> Vec<(String, String)> {
    pattern
        .captures_iter(raw)
        .filter_map(|captures| {
            let name = captures.get(1)?.as_str().to_ascii_lowercase();
            let value = captures
                .get(2)
                .or_else(|| captures.get(3))
                .or_else(|| captures.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}
