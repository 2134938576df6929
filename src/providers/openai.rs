use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;

use crate::core::config::Settings;
use crate::core::errors::{AppError, AppResult};
use crate::providers::{ChatMessage, ExtractionOracle};

/// Blocking chat-completions client.
///
/// Build and drop it outside the async runtime; only call `complete` from a
/// blocking pool thread.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(settings: &Settings, api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::ProviderAuth);
        }
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;
        Ok(Self {
            http,
            api_key,
            model: settings.openai_model.clone(),
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
        })
    }
}

impl ExtractionOracle for OpenAiClient {
    fn complete(&self, messages: &[ChatMessage]) -> AppResult<String> {
        let endpoint = format!("{}/chat/completions", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    AppError::ProviderTimeout
                } else {
                    AppError::Network(err.to_string())
                }
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(AppError::ProviderAuth),
            StatusCode::TOO_MANY_REQUESTS => return Err(AppError::ProviderRateLimited),
            status if !status.is_success() => {
                let body = response.text().unwrap_or_default();
                return Err(AppError::ProviderInvalidResponse(format!(
                    "status {status} body {body}"
                )));
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .map_err(|err| AppError::ProviderInvalidResponse(err.to_string()))?;
        message_content(&body)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

fn message_content(body: &Value) -> AppResult<String> {
    body.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices: &Vec<Value>| choices.first())
        .and_then(|choice: &Value| choice.get("message"))
        .and_then(|message: &Value| message.get("content"))
        .map(|content: &Value| content.as_str().unwrap_or_default().to_string())
        .ok_or_else(|| AppError::ProviderInvalidResponse("missing message content".to_string()))
}
