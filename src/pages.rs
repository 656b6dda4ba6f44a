//! Hidden page ranges for the paginated viewer.
//!
//! A `!hide-page-range=<spec>` directive hides pages without touching the
//! PDF. `<spec>` is a comma-separated list of `N`, `START-END` or `START-`
//! (through the last page), 1-indexed. Malformed tokens are skipped one by
//! one; end bounds are clamped to the page count. Several directives on one
//! manual are combined.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::ManualRecord;
use crate::tags::Tag;

pub const HIDE_PAGE_RANGE: &str = "hide-page-range";

/// Pages named by one range spec, within `1..=total`.
pub fn parse_page_ranges(spec: &str, total: u32) -> BTreeSet<u32> {
    let mut pages = BTreeSet::new();
    for token in spec.split(',') {
        if let Some((start, end)) = parse_token(token.trim(), total) {
            pages.extend(start..=end);
        }
    }
    pages
}

/// Inclusive bounds for one token, or `None` when it selects nothing.
fn parse_token(token: &str, total: u32) -> Option<(u32, u32)> {
    if token.is_empty() {
        return None;
    }

    let (start, end) = match token.split_once('-') {
        Some((start, "")) => (parse_page(start)?, total),
        Some((start, end)) => (parse_page(start)?, parse_page(end)?),
        None => {
            let page = parse_page(token)?;
            (page, page)
        }
    };

    let end = end.min(total);
    (start >= 1 && start <= end).then_some((start, end))
}

fn parse_page(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Union of every `!hide-page-range` directive in `tags`.
pub fn hidden_pages(tags: &[Tag], total: u32) -> BTreeSet<u32> {
    tags.iter()
        .filter_map(|tag| match tag {
            Tag::Directive {
                name,
                payload: Some(spec),
            } if name == HIDE_PAGE_RANGE => Some(parse_page_ranges(spec, total)),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Ascending pages in `1..=total` that are not hidden.
pub fn visible_pages(total: u32, hidden: &BTreeSet<u32>) -> Vec<u32> {
    (1..=total).filter(|page| !hidden.contains(page)).collect()
}

/// Page to scroll to when a deep link asks for `requested`: the page itself
/// when visible, else the next visible page, else the previous one.
pub fn scroll_target(requested: u32, visible: &[u32]) -> Option<u32> {
    if visible.is_empty() {
        return None;
    }
    match visible.binary_search(&requested) {
        Ok(idx) => Some(visible[idx]),
        Err(idx) if idx < visible.len() => Some(visible[idx]),
        Err(_) => visible.last().copied(),
    }
}

/// Page layout of one manual as the viewer renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub path: String,
    pub page_count: u32,
    pub hidden: Vec<u32>,
    pub visible: Vec<u32>,
}

impl PageLayout {
    pub fn for_manual(manual: &ManualRecord) -> Self {
        let tags: Vec<Tag> = manual.tags.iter().map(|t| Tag::parse(t)).collect();
        let hidden = hidden_pages(&tags, manual.page_count);
        Self {
            path: manual.path.clone(),
            page_count: manual.page_count,
            visible: visible_pages(manual.page_count, &hidden),
            hidden: hidden.into_iter().collect(),
        }
    }
}
