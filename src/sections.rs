//! Tag sections for the filter sidebar.
//!
//! Sections are derived from every manual's tags on each index load:
//! `brand`, `model`, `device`, `manualType` first (when present), then every
//! other key in lexicographic order. Bare marker tags collect under
//! [`OTHER_SECTION`]. Directive tags never appear.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::ManualRecord;
use crate::tags::{Tag, RESERVED_KEYS};

/// Section holding marker tags. An explicit `other=value` tag lands in the
/// same section and is indistinguishable from the marker `value`.
pub const OTHER_SECTION: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSection {
    pub key: String,
    pub values: Vec<String>,
}

/// Section key and filter value a tag contributes, if any.
pub fn section_entry(tag: &Tag) -> Option<(&str, &str)> {
    match tag {
        Tag::KeyValue { key, value } => Some((key.as_str(), value.as_str())),
        Tag::Marker(token) => Some((OTHER_SECTION, token.as_str())),
        Tag::Directive { .. } => None,
    }
}

pub fn group_tags(manuals: &[ManualRecord]) -> Vec<TagSection> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for manual in manuals {
        for raw in &manual.tags {
            let tag = Tag::parse(raw);
            if let Some((key, value)) = section_entry(&tag) {
                groups
                    .entry(key.to_string())
                    .or_default()
                    .insert(value.to_string());
            }
        }
    }

    let mut sections = Vec::with_capacity(groups.len());
    for key in RESERVED_KEYS {
        if let Some(values) = groups.remove(key) {
            sections.push(TagSection {
                key: key.to_string(),
                values: values.into_iter().collect(),
            });
        }
    }
    sections.extend(groups.into_iter().map(|(key, values)| TagSection {
        key,
        values: values.into_iter().collect(),
    }));
    sections
}
