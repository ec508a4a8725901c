mod fetcher;

use async_trait::async_trait;

pub use fetcher::{GNewsClient, CATEGORIES};

/// Prefixes a [`NewsSource`] uses to signal that nothing usable came back.
pub const FETCH_FAILURE_PREFIXES: [&str; 2] = ["Error:", "No news"];

/// Supplies concatenated headline text for a topic.
///
/// Failures are reported in-band: the returned text starts with one of
/// [`FETCH_FAILURE_PREFIXES`] and is meant to be shown to the user verbatim.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, topic: &str) -> String;
}

pub fn is_fetch_failure(text: &str) -> bool {
    FETCH_FAILURE_PREFIXES.iter().any(|p| text.starts_with(p))
}
