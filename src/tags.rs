//! Tag grammar, sidecar `.tags` files, and the tag merge engine.
//!
//! Tags travel as plain strings in `index.json` and `.tags` files. Internally
//! they are parsed once into [`Tag`]:
//!
//! | Text | Variant |
//! |------|---------|
//! | `brand=Siemens` | [`Tag::KeyValue`] |
//! | `waterproof` | [`Tag::Marker`] |
//! | `!hide-page-range=1-4` | [`Tag::Directive`] |
//!
//! A `key=value` form needs a key made of ASCII letters, digits, `_` or `-`.
//! The value is everything after the first `=`, so it may contain more `=`.
//!
//! A marker is its own key and value: `promo` and `promo=promo` are the same
//! tag, and both are written as `promo` after a merge.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::ManualMetadata;

/// The four keys filled from extracted metadata.
pub const RESERVED_KEYS: [&str; 4] = ["brand", "model", "device", "manualType"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    KeyValue { key: String, value: String },
    Marker(String),
    /// Viewer-only instruction, written with a leading `!`.
    Directive {
        name: String,
        payload: Option<String>,
    },
}

impl Tag {
    pub fn parse(raw: &str) -> Tag {
        let text = raw.trim();

        if let Some(rest) = text.strip_prefix('!') {
            return match rest.split_once('=') {
                Some((name, payload)) => Tag::Directive {
                    name: name.to_string(),
                    payload: Some(payload.to_string()),
                },
                None => Tag::Directive {
                    name: rest.to_string(),
                    payload: None,
                },
            };
        }

        match text.split_once('=') {
            Some((key, value)) if is_valid_key(key) => Tag::KeyValue {
                key: key.to_string(),
                value: value.to_string(),
            },
            _ => Tag::Marker(text.to_string()),
        }
    }

    pub fn key_value(key: &str, value: &str) -> Tag {
        Tag::KeyValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_directive(&self) -> bool {
        matches!(self, Tag::Directive { .. })
    }

    /// Slot this tag occupies when merging: one tag per slot. Markers share
    /// the key space, so a marker `brand` replaces a `brand=...` tag.
    fn slot(&self) -> Slot {
        match self {
            Tag::KeyValue { key, .. } => Slot::Key(key.clone()),
            Tag::Marker(token) => Slot::Key(token.clone()),
            Tag::Directive { name, .. } => Slot::Directive(name.clone()),
        }
    }

    /// `key=key` collapses to the marker `key`.
    fn normalized(self) -> Tag {
        match self {
            Tag::KeyValue { key, value } if key == value => Tag::Marker(key),
            other => other,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::KeyValue { key, value } => write!(f, "{}={}", key, value),
            Tag::Marker(token) => f.write_str(token),
            Tag::Directive {
                name,
                payload: Some(payload),
            } => write!(f, "!{}={}", name, payload),
            Tag::Directive {
                name,
                payload: None,
            } => write!(f, "!{}", name),
        }
    }
}

pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

pub fn parse_tags<S: AsRef<str>>(raw: &[S]) -> Vec<Tag> {
    raw.iter().map(|t| Tag::parse(t.as_ref())).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Key(String),
    Directive(String),
}

/// Tags derived from extracted metadata, in reserved-key order. Empty
/// fields produce no tag.
pub fn auto_tags(meta: &ManualMetadata) -> Vec<Tag> {
    let fields = [
        &meta.brand,
        &meta.model,
        &meta.device,
        &meta.manual_type,
    ];
    RESERVED_KEYS
        .iter()
        .zip(fields)
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| Tag::key_value(key, value))
        .collect()
}

/// Merges auto-derived tags with user tags.
///
/// Later tags replace earlier ones in the same slot but keep the slot's
/// original position, so the output is ordered by first appearance of each
/// key. User tags always win over auto tags for the same key, and a tag
/// whose key equals its value comes out as a bare marker.
pub fn merge_tags(auto: &[Tag], user: &[Tag]) -> Vec<Tag> {
    let mut merged: Vec<(Slot, Tag)> = Vec::with_capacity(auto.len() + user.len());
    for tag in auto.iter().chain(user) {
        let slot = tag.slot();
        match merged.iter_mut().find(|(s, _)| *s == slot) {
            Some(existing) => existing.1 = tag.clone(),
            None => merged.push((slot, tag.clone())),
        }
    }
    merged
        .into_iter()
        .map(|(_, tag)| tag.normalized())
        .collect()
}

/// Pairing key shared by a document and its sidecar: the path with the last
/// `.suffix` of its file name removed. `dir/foo.pdf` and `dir/foo.tags` both
/// map to `dir/foo`; a bare `dir/.pdf` maps to `dir/`.
pub fn sidecar_stem(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.rfind('.').map_or(name.as_str(), |dot| &name[..dot]);
    path.with_file_name(stem)
}

/// Reads a `.tags` file: one tag per line, trimmed, blank lines dropped.
pub fn read_tags_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tag file: {}", path.display()))?;
    Ok(parse_tag_lines(&content))
}

pub fn parse_tag_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn texts(tags: &[Tag]) -> Vec<String> {
        tags.iter().map(Tag::to_string).collect()
    }

    #[test]
    fn parses_the_three_tag_forms() {
        assert_eq!(Tag::parse("brand=Acme"), Tag::key_value("brand", "Acme"));
        assert_eq!(Tag::parse("  promo "), Tag::Marker("promo".to_string()));
        assert_eq!(
            Tag::parse("!hide-page-range=1-18,37-"),
            Tag::Directive {
                name: "hide-page-range".to_string(),
                payload: Some("1-18,37-".to_string()),
            }
        );
        assert_eq!(
            Tag::parse("!pinned"),
            Tag::Directive {
                name: "pinned".to_string(),
                payload: None,
            }
        );
    }

    #[test]
    fn value_is_split_at_first_equals() {
        assert_eq!(Tag::parse("note=a=b=c"), Tag::key_value("note", "a=b=c"));
        assert_eq!(Tag::parse("note=a=b=c").to_string(), "note=a=b=c");
    }

    #[test]
    fn invalid_key_makes_a_marker() {
        assert_eq!(
            Tag::parse("two words=x"),
            Tag::Marker("two words=x".to_string())
        );
        assert_eq!(Tag::parse("=x"), Tag::Marker("=x".to_string()));
    }

    #[test]
    fn display_round_trips_text() {
        for raw in ["brand=Acme", "promo", "!hide-page-range=3", "!pinned", "k="] {
            assert_eq!(Tag::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn auto_tags_skip_empty_fields() {
        let meta = ManualMetadata {
            brand: "Siemens".to_string(),
            model: String::new(),
            device: "coffee maker".to_string(),
            manual_type: "user manual".to_string(),
        };
        assert_eq!(
            texts(&auto_tags(&meta)),
            vec![
                "brand=Siemens",
                "device=coffee maker",
                "manualType=user manual"
            ]
        );
        assert!(auto_tags(&ManualMetadata::default()).is_empty());
    }

    #[test]
    fn user_override_wins_and_markers_are_kept() {
        let auto = parse_tags(&["brand=A", "model=B"]);
        let user = parse_tags(&["model=C", "promo"]);
        let merged: HashSet<String> = texts(&merge_tags(&auto, &user)).into_iter().collect();
        let expected: HashSet<String> = ["brand=A", "model=C", "promo"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(merged, expected);
    }

    #[test]
    fn merge_keeps_first_insertion_order() {
        let auto = parse_tags(&["brand=A", "model=B", "device=TV"]);
        let user = parse_tags(&["color=red", "brand=Z"]);
        assert_eq!(
            texts(&merge_tags(&auto, &user)),
            vec!["brand=Z", "model=B", "device=TV", "color=red"]
        );
    }

    #[test]
    fn each_key_appears_once() {
        let user = parse_tags(&["size=S", "size=M", "size=L", "promo", "promo"]);
        assert_eq!(texts(&merge_tags(&[], &user)), vec!["size=L", "promo"]);
    }

    #[test]
    fn user_marker_replaces_key_of_same_name() {
        let auto = parse_tags(&["brand=Acme", "model=X1"]);
        let user = parse_tags(&["brand"]);
        assert_eq!(texts(&merge_tags(&auto, &user)), vec!["brand", "model=X1"]);

        let user = parse_tags(&["promo", "promo=summer"]);
        assert_eq!(texts(&merge_tags(&[], &user)), vec!["promo=summer"]);
    }

    #[test]
    fn key_equal_to_value_is_written_bare() {
        let user = parse_tags(&["color=color"]);
        assert_eq!(texts(&merge_tags(&[], &user)), vec!["color"]);
        assert_eq!(
            merge_tags(&[], &user),
            vec![Tag::Marker("color".to_string())]
        );
    }

    #[test]
    fn directives_override_by_name() {
        let user = parse_tags(&["!hide-page-range=1", "!hide-page-range=2-3"]);
        assert_eq!(texts(&merge_tags(&[], &user)), vec!["!hide-page-range=2-3"]);
    }

    #[test]
    fn tag_lines_are_trimmed_and_blank_lines_dropped() {
        let content = "brand=Acme\r\n\n   \n  promo  \r\n\t\nmodel=X1";
        assert_eq!(
            parse_tag_lines(content),
            vec!["brand=Acme", "promo", "model=X1"]
        );
    }

    #[test]
    fn sidecar_stem_pairs_by_base_name() {
        assert_eq!(
            sidecar_stem(Path::new("x/y.pdf")),
            sidecar_stem(Path::new("x/y.tags"))
        );
        assert_eq!(
            sidecar_stem(Path::new("x/y.PDF")),
            sidecar_stem(Path::new("x/y.TAGS"))
        );
        assert_ne!(
            sidecar_stem(Path::new("x/y.pdf")),
            sidecar_stem(Path::new("z/y.tags"))
        );
        assert_eq!(sidecar_stem(Path::new("a.b.tags")), PathBuf::from("a.b"));
        assert_eq!(
            sidecar_stem(Path::new("x/.pdf")),
            sidecar_stem(Path::new("x/.tags"))
        );
        assert_ne!(
            sidecar_stem(Path::new("x/.pdf")),
            sidecar_stem(Path::new("x/y.tags"))
        );
    }
}
