//! Advice-generation provider boundary.

use std::future::Future;
use std::time::Duration;

use serde_json::{json, Value};

use super::prompt::AdvicePrompt;
use crate::config::GeminiConfig;
use crate::error::{AdviceError, Result};

/// Turns a prompt + response schema into raw reply text.
pub trait AdviceProvider: Send + Sync {
    fn generate(&self, request: &AdvicePrompt) -> impl Future<Output = Result<String>> + Send;
}

/// Gemini `generateContent` over HTTPS.
#[derive(Clone)]
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AdviceError::ProviderUnavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

impl AdviceProvider for GeminiProvider {
    async fn generate(&self, request: &AdvicePrompt) -> Result<String> {
        let body = request_body(request);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdviceError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AdviceError::provider(status.as_u16(), &text));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AdviceError::MalformedResponse(format!("undecodable provider envelope: {}", e)))?;

        reply_text(&payload)
    }
}

fn request_body(request: &AdvicePrompt) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema,
        }
    })
}

/// Concatenated text parts of the first candidate.
fn reply_text(payload: &Value) -> Result<String> {
    let text: String = payload["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AdviceError::EmptyResponse);
    }
    Ok(text)
}
