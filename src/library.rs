//! Read side of the index: loading, tag selections, search and lookup.
//!
//! A [`Selection`] holds the values picked per section in the sidebar.
//! Sections are AND-ed together; values inside one section are OR-ed.
//! Search is a case-insensitive substring match over the filename, the PDF
//! title and the displayed tags.

use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::models::{IndexDocument, ManualRecord};
use crate::sections::{group_tags, section_entry, TagSection};
use crate::tags::Tag;

/// Values selected per section key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    sections: BTreeMap<String, BTreeSet<String>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection from `key=value` filters as given on the command
    /// line or in `?tag=` query parameters.
    pub fn from_filters<S: AsRef<str>>(filters: &[S]) -> Result<Self> {
        let mut selection = Self::new();
        for filter in filters {
            let filter = filter.as_ref();
            match filter.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    selection.select(key.trim(), value.trim());
                }
                _ => bail!("Invalid tag filter '{}': expected key=value", filter),
            }
        }
        Ok(selection)
    }

    pub fn select(&mut self, key: &str, value: &str) {
        self.sections
            .entry(key.to_string())
            .or_default()
            .insert(value.to_string());
    }

    /// Flips one value on or off. A section left without values is removed.
    pub fn toggle(&mut self, key: &str, value: &str) {
        let values = self.sections.entry(key.to_string()).or_default();
        if !values.remove(value) {
            values.insert(value.to_string());
        }
        if values.is_empty() {
            self.sections.remove(key);
        }
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeSet::is_empty)
    }

    pub fn is_selected(&self, key: &str, value: &str) -> bool {
        self.sections
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    pub fn matches(&self, manual: &ManualRecord) -> bool {
        let entries: Vec<Tag> = manual.tags.iter().map(|t| Tag::parse(t)).collect();
        self.sections
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .all(|(key, values)| {
                entries.iter().filter_map(section_entry).any(|(section, value)| {
                    section == key.as_str() && values.contains(value)
                })
            })
    }
}

/// Tags shown to the user: everything except directives.
pub fn display_tags(manual: &ManualRecord) -> Vec<&str> {
    manual
        .tags
        .iter()
        .filter(|raw| !Tag::parse(raw).is_directive())
        .map(String::as_str)
        .collect()
}

/// Value of a `key=value` tag on `manual`.
pub fn tag_value<'a>(manual: &'a ManualRecord, key: &str) -> Option<&'a str> {
    manual.tags.iter().find_map(|raw| {
        let (k, v) = raw.split_once('=')?;
        (k == key && !raw.starts_with('!')).then_some(v)
    })
}

pub fn matches_query(manual: &ManualRecord, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let mut haystack = manual.filename.to_lowercase();
    if let Some(title) = &manual.title {
        haystack.push(' ');
        haystack.push_str(&title.to_lowercase());
    }
    for tag in display_tags(manual) {
        haystack.push(' ');
        haystack.push_str(&tag.to_lowercase());
    }
    haystack.contains(&needle)
}

/// List heading: "Siemens EQ700 — coffee maker (user manual)". Falls back to
/// the title, then the filename, when no metadata tags are present.
pub fn headline(manual: &ManualRecord) -> String {
    let brand = tag_value(manual, "brand").unwrap_or_default();
    let model = tag_value(manual, "model").unwrap_or_default();
    let device = tag_value(manual, "device").unwrap_or_default();
    let manual_type = tag_value(manual, "manualType").unwrap_or_default();

    if [brand, model, device, manual_type].iter().all(|v| v.is_empty()) {
        return manual
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| manual.filename.clone());
    }

    let mut line = [brand, model]
        .iter()
        .filter(|v| !v.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if !device.is_empty() {
        if !line.is_empty() {
            line.push_str(" — ");
        }
        line.push_str(device);
    }
    if !manual_type.is_empty() {
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&format!("({})", manual_type));
    }
    line
}

/// A loaded index.
#[derive(Debug, Clone)]
pub struct Library {
    document: IndexDocument,
}

impl Library {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read index: {}", path.display()))?;
        let document: IndexDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse index: {}", path.display()))?;
        Ok(Self { document })
    }

    pub fn from_document(document: IndexDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &IndexDocument {
        &self.document
    }

    pub fn manuals(&self) -> &[ManualRecord] {
        &self.document.manuals
    }

    pub fn find(&self, path: &str) -> Option<&ManualRecord> {
        self.document.manuals.iter().find(|m| m.path == path)
    }

    pub fn sections(&self) -> Vec<TagSection> {
        group_tags(&self.document.manuals)
    }

    /// Manuals matching both the selection and the search query, in index
    /// order.
    pub fn filter(&self, selection: &Selection, query: &str) -> Vec<&ManualRecord> {
        self.document
            .manuals
            .iter()
            .filter(|m| selection.matches(m) && matches_query(m, query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn manual(path: &str, tags: &[&str]) -> ManualRecord {
        ManualRecord {
            path: path.to_string(),
            filename: path.rsplit('/').next().unwrap_or(path).to_string(),
            content_hash: format!("sha256:{}", path),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            page_count: 3,
            title: None,
            last_modified: Utc::now(),
        }
    }

    fn library() -> Library {
        Library::from_document(IndexDocument {
            generated_at: Utc::now(),
            manuals: vec![
                manual("kitchen/oven.pdf", &["brand=Bosch", "device=oven", "promo"]),
                manual("kitchen/fridge.pdf", &["brand=LG", "device=fridge"]),
                manual("tv.pdf", &["brand=LG", "device=tv", "!hide-page-range=1"]),
            ],
        })
    }

    fn paths(manuals: Vec<&ManualRecord>) -> Vec<&str> {
        manuals.into_iter().map(|m| m.path.as_str()).collect()
    }

    #[test]
    fn empty_selection_matches_everything() {
        let lib = library();
        assert_eq!(lib.filter(&Selection::new(), "").len(), 3);
    }

    #[test]
    fn values_within_a_section_are_alternatives() {
        let lib = library();
        let selection = Selection::from_filters(&["device=oven", "device=tv"]).unwrap();
        assert_eq!(
            paths(lib.filter(&selection, "")),
            vec!["kitchen/oven.pdf", "tv.pdf"]
        );
    }

    #[test]
    fn sections_are_combined() {
        let lib = library();
        let selection = Selection::from_filters(&["brand=LG", "device=fridge"]).unwrap();
        assert_eq!(paths(lib.filter(&selection, "")), vec!["kitchen/fridge.pdf"]);
    }

    #[test]
    fn markers_are_selected_through_other() {
        let lib = library();
        let selection = Selection::from_filters(&["other=promo"]).unwrap();
        assert_eq!(paths(lib.filter(&selection, "")), vec!["kitchen/oven.pdf"]);
    }

    #[test]
    fn other_key_and_marker_share_a_section() {
        let lib = Library::from_document(IndexDocument {
            generated_at: Utc::now(),
            manuals: vec![
                manual("a.pdf", &["other=promo"]),
                manual("b.pdf", &["promo"]),
                manual("c.pdf", &["other=sale"]),
            ],
        });
        let selection = Selection::from_filters(&["other=promo"]).unwrap();
        assert_eq!(paths(lib.filter(&selection, "")), vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut selection = Selection::new();
        selection.toggle("brand", "LG");
        assert!(selection.is_selected("brand", "LG"));
        selection.toggle("brand", "LG");
        assert!(selection.is_empty());
        selection.select("device", "tv");
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn malformed_filter_is_rejected() {
        assert!(Selection::from_filters(&["brand"]).is_err());
        assert!(Selection::from_filters(&["=LG"]).is_err());
    }

    #[test]
    fn search_is_case_insensitive_and_ignores_directives() {
        let lib = library();
        assert_eq!(paths(lib.filter(&Selection::new(), "FRIDGE")), vec!["kitchen/fridge.pdf"]);
        assert_eq!(paths(lib.filter(&Selection::new(), "bosch")), vec!["kitchen/oven.pdf"]);
        assert!(lib.filter(&Selection::new(), "hide-page").is_empty());
    }

    #[test]
    fn search_covers_title() {
        let mut m = manual("a.pdf", &[]);
        m.title = Some("Quick Start Guide".to_string());
        assert!(matches_query(&m, "quick start"));
        assert!(!matches_query(&m, "warranty"));
    }

    #[test]
    fn headline_from_reserved_tags() {
        let m = manual(
            "a.pdf",
            &["brand=Siemens", "model=EQ700", "device=coffee maker", "manualType=user manual"],
        );
        assert_eq!(headline(&m), "Siemens EQ700 — coffee maker (user manual)");
        assert_eq!(headline(&manual("b.pdf", &["promo"])), "b.pdf");
        assert_eq!(headline(&manual("c.pdf", &["brand=LG"])), "LG");
    }

    #[test]
    fn find_by_path_and_sections() {
        let lib = library();
        assert!(lib.find("tv.pdf").is_some());
        assert!(lib.find("missing.pdf").is_none());
        let keys: Vec<String> = lib.sections().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["brand", "device", "other"]);
    }

    #[test]
    fn display_tags_skip_directives() {
        let lib = library();
        assert_eq!(
            display_tags(lib.find("tv.pdf").unwrap()),
            vec!["brand=LG", "device=tv"]
        );
    }
}
