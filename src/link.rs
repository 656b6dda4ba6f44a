//! Shareable deep links: `?pdf=<relative-path>&page=<n>`.
//!
//! Opening a manual rewrites only `pdf` and `page` and leaves every other
//! query parameter (and its order) alone, so closing it again restores the
//! query the user started from.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

pub const PDF_PARAM: &str = "pdf";
pub const PAGE_PARAM: &str = "page";

/// Characters escaped in query keys and values. `/` stays readable in paths.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Splits a query string (with or without the leading `?`) into decoded
/// pairs. `+` decodes to a space.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(text: &str) -> String {
    let text = text.replace('+', " ");
    percent_decode_str(&text).decode_utf8_lossy().into_owned()
}

fn encode(text: &str) -> String {
    utf8_percent_encode(text, QUERY_VALUE).to_string()
}

/// Formats pairs as `?k=v&...`, or an empty string when there are none.
pub fn format_query(params: &[(String, String)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let body = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{}", body)
}

/// The manual (and page) a URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub pdf: String,
    pub page: Option<u32>,
}

impl DeepLink {
    /// Reads `pdf` and `page` from decoded query pairs. A `page` that is not
    /// a positive integer is ignored.
    pub fn from_params(params: &[(String, String)]) -> Option<Self> {
        let pdf = param(params, PDF_PARAM).filter(|p| !p.is_empty())?;
        let page = param(params, PAGE_PARAM)
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1);
        Some(Self {
            pdf: pdf.to_string(),
            page,
        })
    }

    pub fn from_query(query: &str) -> Option<Self> {
        Self::from_params(&parse_query(query))
    }

    pub fn to_query(&self) -> String {
        format_query(&open_manual(&[], &self.pdf, self.page))
    }
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Query pairs with `pdf` set to `path` and `page` set or removed.
pub fn open_manual(
    params: &[(String, String)],
    path: &str,
    page: Option<u32>,
) -> Vec<(String, String)> {
    let mut next = close_manual(params);
    next.push((PDF_PARAM.to_string(), path.to_string()));
    if let Some(page) = page {
        next.push((PAGE_PARAM.to_string(), page.to_string()));
    }
    next
}

/// Query pairs without `pdf` and `page`.
pub fn close_manual(params: &[(String, String)]) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(k, _)| k != PDF_PARAM && k != PAGE_PARAM)
        .cloned()
        .collect()
}

/// Absolute link to a manual for sharing (and for QR codes).
pub fn share_url(base: &str, path: &str, page: Option<u32>) -> String {
    let base = base.split(['?', '#']).next().unwrap_or(base);
    let link = DeepLink {
        pdf: path.to_string(),
        page,
    };
    format!("{}{}", base, link.to_query())
}
