//! Structured metadata extraction through a language model.
//!
//! Defines the [`MetadataExtractor`] trait and the OpenAI-compatible
//! implementation used by the indexer. Use [`create_extractor`] to build the
//! configured one; it returns `None` when extraction is disabled.
//!
//! The model is asked for a minified JSON object with the keys `brand`,
//! `model`, `device` and `manualType`. Replies wrapped in Markdown code
//! fences or surrounded by prose are tolerated; anything that does not
//! contain a JSON object is an error.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::ExtractionConfig;
use crate::models::ManualMetadata;
use crate::pdf::truncate_chars;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts structured metadata from device manuals.";

/// Source of brand/model/device/manual-type fields for a document's text.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Identifier used in logs (e.g. the model name).
    fn name(&self) -> &str;

    async fn extract(&self, text: &str) -> Result<ManualMetadata>;
}

/// Builds the configured extractor, or `None` for `provider = "disabled"`.
///
/// # Errors
///
/// Fails when the provider is unknown or `OPENAI_API_KEY` is not set.
pub fn create_extractor(config: &ExtractionConfig) -> Result<Option<Box<dyn MetadataExtractor>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "openai" => Ok(Some(Box::new(OpenAiExtractor::new(config)?))),
        other => bail!("Unknown extraction provider: {}", other),
    }
}

/// Calls `POST {base_url}/chat/completions` on an OpenAI-compatible API.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_text_chars: usize,
}

impl OpenAiExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = format!(
            "{}/chat/completions",
            config.resolved_base_url().trim_end_matches('/')
        );

        Ok(Self {
            client,
            api_key,
            endpoint,
            model: config.model.clone(),
            max_text_chars: config.max_text_chars,
        })
    }
}

#[async_trait]
impl MetadataExtractor for OpenAiExtractor {
    fn name(&self) -> &str {
        &self.model
    }

    async fn extract(&self, text: &str) -> Result<ManualMetadata> {
        let prompt = build_prompt(truncate_chars(text, self.max_text_chars));
        tracing::trace!("extraction prompt:\n{}", prompt);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.2,
            "max_tokens": 256,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("extraction API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        let content = json
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid completion response: missing content"))?;
        tracing::debug!("extraction reply: {}", content);

        parse_reply(content)
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"You are an expert at extracting structured metadata from home appliance manuals. Given the following manual text, extract:
- brand (e.g., Siemens, Samsung, LG)
- model (e.g., EQ700, TQ700, XR-1234)
- device (e.g., coffee maker, fridge, TV, washing machine)
- manualType (e.g., user manual, installation guide, warranty, quick start guide)

If a field is not found, return an empty string for that field.

Return ONLY a minified JSON object with these exact keys: brand, model, device, manualType. Do not include any explanation or extra text.

Example output:
{{"brand":"Siemens","model":"EQ700","device":"integral coffeemaker","manualType":"user manual"}}

Manual text:
"""
{}
""""#,
        text
    )
}

/// Parses a model reply into metadata.
pub fn parse_reply(content: &str) -> Result<ManualMetadata> {
    let start = content.find('{');
    let end = content.rfind('}');
    let object = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => bail!("reply contains no JSON object: {}", content),
    };

    let value: serde_json::Value = serde_json::from_str(object)
        .with_context(|| format!("reply is not valid JSON: {}", object))?;
    if !value.is_object() {
        bail!("reply is not a JSON object: {}", object);
    }
    Ok(ManualMetadata::from_json(&value).trimmed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_reply() {
        let meta = parse_reply(
            r#"{"brand":"Siemens","model":"EQ700","device":"integral coffeemaker","manualType":"user manual"}"#,
        )
        .unwrap();
        assert_eq!(meta.brand, "Siemens");
        assert_eq!(meta.model, "EQ700");
        assert_eq!(meta.device, "integral coffeemaker");
        assert_eq!(meta.manual_type, "user manual");
    }

    #[test]
    fn parses_fenced_reply_with_missing_fields() {
        let meta = parse_reply("```json\n{\"brand\": \"LG\", \"model\": null}\n```").unwrap();
        assert_eq!(meta.brand, "LG");
        assert_eq!(meta.model, "");
        assert_eq!(meta.manual_type, "");
    }

    #[test]
    fn reply_fields_are_trimmed() {
        let meta = parse_reply(r#"{"brand":"  Bosch ","device":"oven\t"}"#).unwrap();
        assert_eq!(meta.brand, "Bosch");
        assert_eq!(meta.device, "oven");
    }

    #[test]
    fn rejects_prose_without_json() {
        assert!(parse_reply("I could not find any metadata.").is_err());
        assert!(parse_reply("} backwards {").is_err());
        assert!(parse_reply("{not json}").is_err());
    }

    #[test]
    fn prompt_embeds_text() {
        let prompt = build_prompt("WASHER 3000");
        assert!(prompt.contains("\"\"\"\nWASHER 3000\n\"\"\""));
        assert!(prompt.contains(r#"{"brand":"Siemens""#));
    }

    #[test]
    fn disabled_provider_builds_nothing() {
        let config = ExtractionConfig {
            provider: "disabled".to_string(),
            ..Default::default()
        };
        assert!(create_extractor(&config).unwrap().is_none());
    }
}
