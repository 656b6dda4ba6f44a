//! Core data models shared by the indexer and the viewer.
//!
//! These are the serialized shapes of `index.json` and `llm-cache.json`.
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One indexed PDF manual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualRecord {
    /// Path relative to the collection root, `/`-separated.
    pub path: String,
    pub filename: String,
    /// `sha256:<hex>` of the file bytes.
    pub content_hash: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub last_modified: DateTime<Utc>,
}

/// The whole `index.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub manuals: Vec<ManualRecord>,
}

/// Structured fields obtained from the extraction provider.
///
/// Every field is a plain string; a missing or non-string field deserializes
/// to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualMetadata {
    pub brand: String,
    pub model: String,
    pub device: String,
    pub manual_type: String,
}

impl ManualMetadata {
    pub fn is_empty(&self) -> bool {
        self.brand.is_empty()
            && self.model.is_empty()
            && self.device.is_empty()
            && self.manual_type.is_empty()
    }

    /// Builds metadata from an arbitrary JSON value, keeping only string
    /// fields (verbatim) and defaulting everything else to empty.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_default()
        };
        Self {
            brand: field("brand"),
            model: field("model"),
            device: field("device"),
            manual_type: field("manualType"),
        }
    }

    /// Same fields with surrounding whitespace removed.
    pub fn trimmed(self) -> Self {
        let trim = |s: String| s.trim().to_string();
        Self {
            brand: trim(self.brand),
            model: trim(self.model),
            device: trim(self.device),
            manual_type: trim(self.manual_type),
        }
    }
}

/// One entry of `llm-cache.json`, keyed by relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content hash the metadata was extracted from.
    pub hash: String,
    #[serde(flatten)]
    pub metadata: ManualMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_document() -> IndexDocument {
        IndexDocument {
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            manuals: vec![
                ManualRecord {
                    path: "kitchen/eq700.pdf".to_string(),
                    filename: "eq700.pdf".to_string(),
                    content_hash: "sha256:abcd".to_string(),
                    tags: vec!["brand=Siemens".to_string(), "promo".to_string()],
                    page_count: 40,
                    title: Some(String::new()),
                    last_modified: Utc.with_ymd_and_hms(2025, 11, 2, 8, 30, 15).unwrap(),
                },
                ManualRecord {
                    path: "tv.pdf".to_string(),
                    filename: "tv.pdf".to_string(),
                    content_hash: "sha256:ef01".to_string(),
                    tags: vec![],
                    page_count: 0,
                    title: None,
                    last_modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                },
            ],
        }
    }

    #[test]
    fn index_document_survives_json_round_trip() {
        let doc = sample_document();
        let json = serde_json::to_string_pretty(&doc).unwrap();
        let back: IndexDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn index_document_uses_camel_case_fields() {
        let json = serde_json::to_value(sample_document()).unwrap();
        assert!(json.get("generatedAt").is_some());
        let first = &json["manuals"][0];
        assert_eq!(first["contentHash"], "sha256:abcd");
        assert_eq!(first["pageCount"], 40);
        assert!(first.get("lastModified").is_some());
        assert!(json["manuals"][1].get("title").is_none());
    }

    #[test]
    fn cache_entry_is_flat_on_the_wire() {
        let entry = CacheEntry {
            hash: "sha256:00".to_string(),
            metadata: ManualMetadata {
                brand: "LG".to_string(),
                manual_type: "user manual".to_string(),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "hash": "sha256:00",
                "brand": "LG",
                "model": "",
                "device": "",
                "manualType": "user manual"
            })
        );
    }

    #[test]
    fn metadata_from_json_ignores_non_strings() {
        let value = serde_json::json!({"brand": "Bosch", "model": 42, "device": null});
        let meta = ManualMetadata::from_json(&value);
        assert_eq!(meta.brand, "Bosch");
        assert_eq!(meta.model, "");
        assert_eq!(meta.device, "");
        assert_eq!(meta.manual_type, "");
        assert!(!meta.is_empty());
    }

    #[test]
    fn metadata_from_json_keeps_whitespace_until_trimmed() {
        let value = serde_json::json!({"brand": " LG ", "device": "tv\n"});
        let meta = ManualMetadata::from_json(&value);
        assert_eq!(meta.brand, " LG ");
        assert_eq!(meta.device, "tv\n");

        let meta = meta.trimmed();
        assert_eq!(meta.brand, "LG");
        assert_eq!(meta.device, "tv");
    }
}
