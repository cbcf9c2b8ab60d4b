//! Google Gemini `generateContent` REST client.
//!
//! Wraps the three request shapes the dashboard needs: JSON output
//! constrained to a declared response schema, plain text output, and the
//! inline-image generation variant. Responses are structurally validated
//! before being handed back; anything that does not match the declared
//! shape fails closed with a [`GeminiError::SchemaMismatch`].

pub mod error;

pub use error::{GeminiError, Result};

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Gemini API client.
///
/// Holds one pooled reqwest client with a hard request timeout so a hung
/// upstream call can never park a caller indefinitely.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    image_model: String,
}

// ============================================
// Request types
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inlineData")]
    InlineData(InlineData),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    /// Base64-encoded payload
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    temperature: f32,
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

impl GenerateContentResponse {
    /// First non-empty text part across all candidates, trimmed.
    fn first_text(&self) -> Option<String> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// First inline image payload across all candidates.
    fn first_inline_image(&self) -> Option<&InlineData> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.inline_data.as_ref())
    }
}

/// A binary payload sent inline with a generation request (e.g. the winning
/// pint photo for the shareable-graphic variant).
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, image_model: String) -> Self {
        Self::with_base_url(api_key, model, image_model, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client pointed at a non-default endpoint (used by tests).
    pub fn with_base_url(
        api_key: String,
        model: String,
        image_model: String,
        base_url: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            api_key,
            model,
            image_model,
        }
    }

    /// Whether an API key has been configured.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Request JSON constrained to `schema` and deserialize it into `T`.
    ///
    /// Distinguishes three failure kinds: transport/API errors, empty or
    /// non-JSON bodies, and JSON that parses but violates the expected
    /// shape. The caller decides what to surface; nothing is retried here.
    pub async fn generate_typed<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: Value,
    ) -> Result<T> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart::Text(prompt.to_string())],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema),
                response_modalities: None,
                temperature: 0.7,
            }),
        };

        let response = self.send(&self.model, &request).await?;
        let text = response.first_text().ok_or(GeminiError::EmptyResponse)?;

        let value: Value = serde_json::from_str(&text).map_err(GeminiError::MalformedJson)?;
        serde_json::from_value(value).map_err(|e| GeminiError::SchemaMismatch(e.to_string()))
    }

    /// Request freeform narrative text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart::Text(prompt.to_string())],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                response_modalities: None,
                temperature: 0.7,
            }),
        };

        let response = self.send(&self.model, &request).await?;
        response.first_text().ok_or(GeminiError::EmptyResponse)
    }

    /// Request a generated image, sending `photo` inline with the prompt.
    ///
    /// Returns the raw decoded image bytes from the first inline payload of
    /// the response.
    pub async fn generate_image(&self, prompt: &str, photo: &InlineImage) -> Result<Vec<u8>> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::Text(prompt.to_string()),
                    RequestPart::InlineData(InlineData {
                        mime_type: photo.mime_type.clone(),
                        data: general_purpose::STANDARD.encode(&photo.data),
                    }),
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
                temperature: 0.7,
            }),
        };

        let response = self.send(&self.image_model, &request).await?;
        let inline = response
            .first_inline_image()
            .ok_or(GeminiError::MissingImage)?;

        general_purpose::STANDARD
            .decode(&inline.data)
            .map_err(GeminiError::InvalidImagePayload)
    }

    async fn send(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let start = std::time::Instant::now();
        info!(model = %model, "Calling Gemini generateContent");

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gemini API request failed");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        debug!(
            elapsed_ms = start.elapsed().as_millis(),
            candidates = parsed.candidates.len(),
            "Gemini response received"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Angle {
        analysis: String,
        caption: String,
        hashtags: Vec<String>,
    }

    fn response_with_text(text: &str) -> GenerateContentResponse {
        serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": text } ] } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn client_not_configured_without_key() {
        let client = GeminiClient::new(String::new(), "m".into(), "img".into());
        assert!(!client.is_configured());
    }

    #[test]
    fn client_configured_with_key() {
        let client = GeminiClient::new("test-api-key".into(), "m".into(), "img".into());
        assert!(client.is_configured());
    }

    #[test]
    fn first_text_skips_empty_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "   " }, { "text": "hello" } ] } }
            ]
        }))
        .unwrap();
        assert_eq!(response.first_text().as_deref(), Some("hello"));
    }

    #[test]
    fn first_text_none_for_empty_candidates() {
        let response = GenerateContentResponse::default();
        assert!(response.first_text().is_none());
    }

    #[test]
    fn inline_image_extracted_from_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [
                    { "text": "here is your graphic" },
                    { "inlineData": { "mimeType": "image/png", "data": "aGk=" } }
                ] } }
            ]
        }))
        .unwrap();
        let inline = response.first_inline_image().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "aGk=");
    }

    #[test]
    fn typed_parse_rejects_missing_fields() {
        // {"analysis":"x"} alone must not produce a partially-populated value
        let response = response_with_text(r#"{"analysis":"x"}"#);
        let text = response.first_text().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let parsed: std::result::Result<Angle, _> = serde_json::from_value(value);
        assert!(parsed.is_err());
    }

    #[test]
    fn typed_parse_accepts_complete_shape() {
        let response = response_with_text(
            r##"{"analysis":"great pint","caption":"cheers","hashtags":["#Stoutly","#Guinness"]}"##,
        );
        let text = response.first_text().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let parsed: Angle = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.hashtags.len(), 2);
    }
}
