use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, Result};

use super::NewsSource;

pub const GNEWS_API_URL: &str = "https://gnews.io/api/v4";

/// Topics routed to the headlines endpoint instead of free-text search.
pub const CATEGORIES: [&str; 8] = [
    "top",
    "business",
    "politics",
    "sports",
    "world",
    "health",
    "science",
    "technology",
];

#[derive(Debug, Deserialize)]
struct GNewsResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Debug, Deserialize)]
struct GNewsArticle {
    title: String,
    description: Option<String>,
}

pub struct GNewsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    language: String,
    country: String,
    max_articles: u32,
}

impl GNewsClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, GNEWS_API_URL)
    }

    pub fn with_base_url(config: &Config, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("news-digest/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.gnews_api_key.clone(),
            language: config.gnews_language.clone(),
            country: config.gnews_country.clone(),
            max_articles: config.gnews_max_articles,
        })
    }

    fn request_url(&self, topic: &str, api_key: &str) -> String {
        let common = format!(
            "lang={}&country={}&max={}&apikey={}",
            urlencoding::encode(&self.language),
            urlencoding::encode(&self.country),
            self.max_articles,
            urlencoding::encode(api_key),
        );
        if CATEGORIES.contains(&topic) {
            format!("{}/top-headlines?category={}&{}", self.base_url, topic, common)
        } else {
            format!(
                "{}/search?q={}&{}",
                self.base_url,
                urlencoding::encode(topic),
                common
            )
        }
    }

    /// Fetches and flattens articles to one `title - description` line each.
    pub async fn fetch_headlines(&self, topic: &str) -> Result<Vec<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AppError::NewsApi("GNews API Key not found.".to_string()));
        };

        let url = self.request_url(topic, api_key);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::FORBIDDEN => {
                return Err(AppError::NewsApi(
                    "Invalid or expired GNews API key (403 Forbidden).".to_string(),
                ))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AppError::NewsApi(
                    "GNews Request limit reached (429 Too Many Requests).".to_string(),
                ))
            }
            status => {
                return Err(AppError::NewsApi(format!(
                    "Unexpected response from GNews (status {}).",
                    status.as_u16()
                )))
            }
        }

        let body: GNewsResponse = response.json().await?;
        tracing::debug!("GNews returned {} articles for {:?}", body.articles.len(), topic);

        Ok(body
            .articles
            .into_iter()
            .map(|a| {
                format!(
                    "{} - {}",
                    a.title,
                    a.description
                        .unwrap_or_else(|| "No description available.".to_string())
                )
            })
            .collect())
    }
}

#[async_trait]
impl NewsSource for GNewsClient {
    async fn fetch(&self, topic: &str) -> String {
        match self.fetch_headlines(topic).await {
            Ok(lines) if lines.is_empty() => {
                format!("No news found for '{}' at the moment.", topic)
            }
            Ok(lines) => lines.join("\n"),
            Err(AppError::NewsApi(msg)) => format!("Error: {}", msg),
            Err(e) => {
                tracing::warn!("GNews request failed: {}", e);
                format!("Error: Network issue occurred while contacting GNews: {}", e)
            }
        }
    }
}
