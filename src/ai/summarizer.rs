use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};

use super::Summarize;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const SYSTEM_PROMPT: &str = "You are an expert news analyst. Summarize the following news headlines and snippets \
into exactly 5 short, clear, and objective bullet points. Use only the provided context.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

pub struct GeminiSummarizer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiSummarizer {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, GEMINI_API_URL)
    }

    pub fn with_base_url(config: &Config, base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        })
    }

    pub async fn generate_summary(&self, news_data: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AppError::Config("Gemini API Key missing.".to_string()));
        };

        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(SYSTEM_PROMPT.to_string()),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(format!("News Data:\n{}", news_data)),
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(AppError::Summarizer(format!(
                "status {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: GenerateResponse = response.json().await?;
        let summary = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("\n");

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(AppError::Other(anyhow::anyhow!("model returned no text")));
        }
        Ok(summary.to_string())
    }

    pub fn model_version(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Summarize for GeminiSummarizer {
    async fn summarize(&self, news_data: &str) -> String {
        match self.generate_summary(news_data).await {
            Ok(summary) => summary,
            Err(AppError::Summarizer(msg)) => format!("Gemini AI API error: {}", msg),
            Err(AppError::Config(msg)) => format!("AI summarization failed: {}", msg),
            Err(e) => {
                tracing::warn!("Summarization with {} failed: {}", self.model_version(), e);
                format!("AI summarization failed: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::ai::is_summary_failure;

    fn config(api_key: Option<&str>) -> Config {
        Config {
            gemini_api_key: api_key.map(str::to_string),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn returns_trimmed_candidate_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.0-flash:generateContent")
                .header("x-goog-api-key", "secret")
                .body_contains("News Data:\\nAI chips - Demand soars");
            then.status(200).json_body(json!({
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "  * point one\n* point two \n"}]}}
                ]
            }));
        });

        let summarizer =
            GeminiSummarizer::with_base_url(&config(Some("secret")), &server.base_url()).unwrap();
        let summary = summarizer.summarize("AI chips - Demand soars").await;

        mock.assert();
        assert_eq!(summary, "* point one\n* point two");
        assert!(!is_summary_failure(&summary));
    }

    #[tokio::test]
    async fn api_error_is_prefixed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(400).body("bad request");
        });

        let summarizer =
            GeminiSummarizer::with_base_url(&config(Some("secret")), &server.base_url()).unwrap();
        let summary = summarizer.summarize("text").await;
        assert_eq!(summary, "Gemini AI API error: status 400: bad request");
        assert!(is_summary_failure(&summary));
    }

    #[tokio::test]
    async fn empty_candidates_are_a_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"candidates": []}));
        });

        let summarizer =
            GeminiSummarizer::with_base_url(&config(Some("secret")), &server.base_url()).unwrap();
        let summary = summarizer.summarize("text").await;
        assert_eq!(summary, "AI summarization failed: model returned no text");
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let summarizer = GeminiSummarizer::new(&config(None)).unwrap();
        assert_eq!(
            summarizer.summarize("text").await,
            "AI summarization failed: Gemini API Key missing."
        );
    }
}
