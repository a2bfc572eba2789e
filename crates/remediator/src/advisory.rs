//! Advisory source: Gemini client that turns an alert description into
//! free-form diagnostic text and a possible `AUTO:` directive.
//!
//! In demo mode, or without an API key, the client returns a deterministic
//! canned analysis and makes no network calls.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::AgentError;

/// Gemini REST API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models to try, in order, after the configured one.
const MODEL_CANDIDATES: &[&str] = &[
    "gemini-1.5-flash-latest",
    "gemini-1.5-flash-001",
    "gemini-1.5-pro-latest",
];

/// Deterministic analysis returned in demo/offline mode.
pub const CANNED_ANALYSIS: &str = "Probable cause: workload saturation due to increased traffic. \
     Recommended: scale deployment 'cpu-app' to 4 replicas. \
     AUTO: scale deployment cpu-app to 4";

/// Backoff cap between retry attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Client for the advisory source.
pub struct AdvisoryClient {
    client: reqwest::Client,
    api_key: Option<String>,
    configured_model: String,
    /// Last model that produced a response. Read-mostly; a losing concurrent
    /// write is simply overwritten.
    resolved_model: RwLock<Option<String>>,
    retry_count: u32,
    demo_mode: bool,
    base_url: String,
}

impl AdvisoryClient {
    /// Create a client from agent settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            api_key: settings.gemini_api_key.clone(),
            configured_model: settings.gemini_model.clone(),
            resolved_model: RwLock::new(None),
            retry_count: settings.advisory_retry_count.max(1),
            demo_mode: settings.demo_mode,
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Set a custom API base URL (used in tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Clear the cached model name (used in tests).
    pub fn reset_model_cache(&self) {
        if let Ok(mut cached) = self.resolved_model.write() {
            *cached = None;
        }
    }

    /// Analyze an alert description, returning diagnostic text with a
    /// possible `AUTO:` directive. Retries with exponential backoff.
    pub async fn analyze(&self, description: &str) -> Result<String, AgentError> {
        if self.demo_mode || self.api_key.is_none() {
            info!("Advisory source in demo/offline mode; returning canned analysis");
            return Ok(CANNED_ANALYSIS.to_string());
        }

        let prompt = build_prompt(description);
        let mut last_error = String::new();

        for attempt in 1..=self.retry_count {
            match self.try_candidates(&prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(attempt, error = %e, "Advisory attempt failed");
                    last_error = e.to_string();
                }
            }

            if attempt < self.retry_count {
                let backoff = Duration::from_secs(2u64.pow(attempt)).min(MAX_BACKOFF);
                tokio::time::sleep(backoff).await;
            }
        }

        Err(AgentError::Advisory(format!(
            "all {} attempts failed: {last_error}",
            self.retry_count
        )))
    }

    /// Candidate model list: cached winner first, then the configured model,
    /// then the static fallbacks, deduplicated in order.
    fn candidates(&self) -> Vec<String> {
        let mut list = Vec::new();
        if let Ok(cached) = self.resolved_model.read() {
            if let Some(model) = cached.as_ref() {
                list.push(model.clone());
            }
        }
        list.push(self.configured_model.clone());
        list.extend(MODEL_CANDIDATES.iter().map(ToString::to_string));

        let mut seen = Vec::new();
        list.retain(|m| {
            if seen.contains(m) {
                false
            } else {
                seen.push(m.clone());
                true
            }
        });
        list
    }

    /// Try each candidate model once; cache the first that responds.
    async fn try_candidates(&self, prompt: &str) -> anyhow::Result<String> {
        let mut last_error = anyhow::anyhow!("no candidate models");

        for model in self.candidates() {
            debug!(model = %model, "Trying advisory model");
            match self.generate(&model, prompt).await {
                Ok(text) => {
                    if let Ok(mut cached) = self.resolved_model.write() {
                        *cached = Some(model);
                    }
                    return Ok(text);
                }
                Err(e) => {
                    debug!(model = %model, error = %e, "Model attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// One `generateContent` call against one model.
    async fn generate(&self, model: &str, prompt: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY not set"))?;

        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                anyhow::bail!(
                    "Gemini API error: {} - {}",
                    error_response.error.status,
                    error_response.error.message
                );
            }
            anyhow::bail!("Gemini API error ({status}): {body}");
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim().to_string();
        if text.is_empty() {
            anyhow::bail!("Gemini returned an empty response");
        }

        debug!(snippet = %text.chars().take(200).collect::<String>(), "Gemini raw response");
        Ok(text)
    }
}

/// Build the SRE-assistant prompt for one alert description.
fn build_prompt(description: &str) -> String {
    format!(
        "You are a reliable Site Reliability Engineer assistant.\n\
         Analyze the following alert and provide:\n\
         1) A one-sentence probable root cause.\n\
         2) A concise recommended action (e.g., scale deployment, restart pods, investigate logs).\n\
         3) If safe to auto-remediate, include the clear keyword 'AUTO: <action>' \
         (e.g., 'AUTO: scale deployment cpu-app to 4').\n\n\
         Alert description:\n{description}\n\n\
         Keep answer under 100 words and use plain, simple language."
    )
}

// =============================================================================
// Gemini API types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    #[serde(default)]
    status: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(demo_mode: bool, api_key: Option<&str>) -> Settings {
        Settings {
            port: 8000,
            gemini_api_key: api_key.map(ToString::to_string),
            gemini_model: "gemini-1.5-flash-latest".to_string(),
            default_scale_replicas: 4,
            auto_remediate: true,
            demo_mode,
            advisory_retry_count: 1,
        }
    }

    fn success_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] }
            }]
        })
    }

    #[tokio::test]
    async fn test_demo_mode_returns_canned_analysis() {
        let client = AdvisoryClient::new(&settings(true, Some("key")));
        let text = client.analyze("CPU high").await.unwrap();
        assert_eq!(text, CANNED_ANALYSIS);
        assert!(text.contains("AUTO: scale deployment cpu-app to 4"));
    }

    #[tokio::test]
    async fn test_missing_key_returns_canned_analysis() {
        let client = AdvisoryClient::new(&settings(false, None));
        let text = client.analyze("CPU high").await.unwrap();
        assert_eq!(text, CANNED_ANALYSIS);
    }

    #[tokio::test]
    async fn test_successful_generate_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash-latest:generateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body("AUTO: restart deployment my-app")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client =
            AdvisoryClient::new(&settings(false, Some("key"))).with_base_url(server.uri());
        let text = client.analyze("pods crash-looping").await.unwrap();
        assert_eq!(text, "AUTO: restart deployment my-app");
    }

    #[tokio::test]
    async fn test_model_fallback_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash-latest:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "status": "NOT_FOUND", "message": "model not found" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash-001:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("analysis")))
            .mount(&server)
            .await;

        let client =
            AdvisoryClient::new(&settings(false, Some("key"))).with_base_url(server.uri());
        let text = client.analyze("CPU high").await.unwrap();
        assert_eq!(text, "analysis");

        // The working model is cached and tried first on the next call.
        assert_eq!(
            client.candidates().first().map(String::as_str),
            Some("gemini-1.5-flash-001")
        );

        client.reset_model_cache();
        assert_eq!(
            client.candidates().first().map(String::as_str),
            Some("gemini-1.5-flash-latest")
        );
    }

    #[tokio::test]
    async fn test_all_models_failing_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client =
            AdvisoryClient::new(&settings(false, Some("key"))).with_base_url(server.uri());
        let err = client.analyze("CPU high").await.unwrap_err();
        assert!(err.to_string().contains("advisory source failed"));
    }

    #[test]
    fn test_candidates_are_deduplicated() {
        let client = AdvisoryClient::new(&settings(false, Some("key")));
        let candidates = client.candidates();
        // Configured model equals the first static fallback; it appears once.
        assert_eq!(
            candidates,
            vec![
                "gemini-1.5-flash-latest",
                "gemini-1.5-flash-001",
                "gemini-1.5-pro-latest",
            ]
        );
    }

    #[test]
    fn test_prompt_includes_description_and_marker_hint() {
        let prompt = build_prompt("CPU high on node-1");
        assert!(prompt.contains("CPU high on node-1"));
        assert!(prompt.contains("AUTO: <action>"));
    }
}
