mod summarizer;

use async_trait::async_trait;

pub use summarizer::GeminiSummarizer;

/// Prefixes a [`Summarize`] implementation uses to signal failure.
pub const SUMMARY_FAILURE_PREFIXES: [&str; 2] = ["AI summarization failed:", "Gemini AI API error:"];

/// Turns fetched news text into a short digest.
///
/// Like [`crate::news::NewsSource`], failures come back in-band as text
/// starting with one of [`SUMMARY_FAILURE_PREFIXES`].
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, news_data: &str) -> String;
}

pub fn is_summary_failure(text: &str) -> bool {
    SUMMARY_FAILURE_PREFIXES.iter().any(|p| text.starts_with(p))
}
