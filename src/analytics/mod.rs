//! Read-only views derived from the interaction log.
//!
//! Every view distinguishes "nothing to show" from failure: a query that
//! finds no rows yields the view's empty variant, storage errors propagate.

use crate::db::Repository;
use crate::error::Result;
use crate::models::{Interaction, TopicCount};

pub const DEFAULT_HISTORY_LIMIT: usize = 3;
pub const MY_TOPICS_LIMIT: usize = 5;
pub const TRENDING_LIMIT: usize = 5;
pub const DISCOVER_POOL: usize = 10;

const SUMMARY_PREVIEW_CHARS: usize = 120;

/// Parses the optional `/history` argument; anything but a positive integer
/// falls back to [`DEFAULT_HISTORY_LIMIT`].
pub fn history_limit(arg: Option<&str>) -> usize {
    arg.and_then(|a| a.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryView {
    Empty,
    Entries {
        requested: usize,
        interactions: Vec<Interaction>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicsView {
    Empty,
    Ranked(Vec<TopicCount>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoverView {
    /// Either no history anywhere or every trending topic already explored.
    NothingToDiscover,
    /// Unexplored trending topics, most requested first.
    Unexplored(Vec<String>),
}

#[derive(Clone)]
pub struct Analytics {
    repository: Repository,
}

impl Analytics {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn history(&self, chat_id: &str, limit: usize) -> Result<HistoryView> {
        let interactions = self.repository.recent(chat_id, limit).await?;
        if interactions.is_empty() {
            return Ok(HistoryView::Empty);
        }
        Ok(HistoryView::Entries {
            requested: limit,
            interactions,
        })
    }

    pub async fn my_topics(&self, chat_id: &str) -> Result<TopicsView> {
        let counts = self
            .repository
            .topic_frequency(chat_id, MY_TOPICS_LIMIT)
            .await?;
        Ok(ranked(counts))
    }

    pub async fn trending(&self) -> Result<TopicsView> {
        let counts = self.repository.global_topic_frequency(TRENDING_LIMIT).await?;
        Ok(ranked(counts))
    }

    /// Trending topics (top [`DISCOVER_POOL`]) this chat has never asked for.
    pub async fn discover(&self, chat_id: &str) -> Result<DiscoverView> {
        let trending = self.repository.global_topic_frequency(DISCOVER_POOL).await?;
        let explored = self.repository.distinct_topics(chat_id).await?;

        let unexplored: Vec<String> = trending
            .into_iter()
            .map(|tc| tc.topic)
            .filter(|topic| !explored.contains(topic))
            .collect();

        if unexplored.is_empty() {
            Ok(DiscoverView::NothingToDiscover)
        } else {
            Ok(DiscoverView::Unexplored(unexplored))
        }
    }
}

fn ranked(counts: Vec<TopicCount>) -> TopicsView {
    if counts.is_empty() {
        TopicsView::Empty
    } else {
        TopicsView::Ranked(counts)
    }
}

// Rendering

pub fn render_history(view: &HistoryView) -> String {
    match view {
        HistoryView::Empty => "No history found yet. Try /news <topic>!".to_string(),
        HistoryView::Entries {
            requested,
            interactions,
        } => {
            let mut lines = vec![format!("Your last {} news requests:", requested)];
            for (i, item) in interactions.iter().enumerate() {
                lines.push(format!(
                    "{}. [{}] Topic: {}\n   Summary: {}...",
                    i + 1,
                    item.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    item.input_topic,
                    preview(&item.summary, SUMMARY_PREVIEW_CHARS),
                ));
            }
            lines.join("\n\n")
        }
    }
}

pub fn render_my_topics(view: &TopicsView) -> String {
    match view {
        TopicsView::Empty => {
            "No topics found yet! Try /news <topic> to start building your news profile."
                .to_string()
        }
        TopicsView::Ranked(counts) => {
            let mut lines = vec!["Your top requested news topics:".to_string()];
            lines.extend(
                counts
                    .iter()
                    .enumerate()
                    .map(|(i, tc)| format!("{}. {} ({} times)", i + 1, tc.topic, tc.count)),
            );
            lines.join("\n")
        }
    }
}

pub fn render_trending(view: &TopicsView) -> String {
    match view {
        TopicsView::Empty => "No trending topics yet! Be the first to use /news <topic>.".to_string(),
        TopicsView::Ranked(counts) => {
            let mut lines = vec!["Top trending news topics (all users):".to_string()];
            lines.extend(
                counts
                    .iter()
                    .enumerate()
                    .map(|(i, tc)| format!("{}. {} ({} requests)", i + 1, tc.topic, tc.count)),
            );
            lines.join("\n")
        }
    }
}

pub fn render_discover(view: &DiscoverView) -> String {
    match view {
        DiscoverView::NothingToDiscover => {
            "🎉 You've already explored all top trending topics! Try /news to find more."
                .to_string()
        }
        DiscoverView::Unexplored(topics) => {
            let mut lines = vec!["🔥 Trending topics you haven't explored yet:".to_string()];
            lines.extend(
                topics
                    .iter()
                    .enumerate()
                    .map(|(i, topic)| format!("{}. {}", i + 1, topic)),
            );
            lines.push("Try /news <topic> to read about these!".to_string());
            lines.join("\n")
        }
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewInteraction;

    async fn seeded(rows: &[(&str, &str)]) -> Analytics {
        let repo = Repository::open_in_memory().await.unwrap();
        for (chat, topic) in rows {
            repo.append(NewInteraction {
                chat_id: chat.to_string(),
                input_topic: topic.to_string(),
                news_data: String::new(),
                summary: format!("summary for {topic}"),
            })
            .await
            .unwrap();
        }
        Analytics::new(repo)
    }

    #[test]
    fn history_limit_coerces_bad_input() {
        assert_eq!(history_limit(None), 3);
        assert_eq!(history_limit(Some("5")), 5);
        assert_eq!(history_limit(Some("0")), 3);
        assert_eq!(history_limit(Some("-2")), 3);
        assert_eq!(history_limit(Some("lots")), 3);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("short", 120), "short");
    }

    #[tokio::test]
    async fn discover_is_trending_minus_explored() {
        let analytics = seeded(&[
            ("other", "a"),
            ("other", "b"),
            ("other", "c"),
            ("other", "d"),
            ("c1", "a"),
            ("c1", "b"),
        ])
        .await;

        let DiscoverView::Unexplored(mut topics) = analytics.discover("c1").await.unwrap() else {
            panic!("expected unexplored topics");
        };
        topics.sort();
        assert_eq!(topics, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn discover_orders_by_global_frequency() {
        let analytics = seeded(&[
            ("x", "d"),
            ("x", "c"),
            ("y", "c"),
            ("z", "c"),
            ("y", "d"),
        ])
        .await;

        assert_eq!(
            analytics.discover("me").await.unwrap(),
            DiscoverView::Unexplored(vec!["c".to_string(), "d".to_string()])
        );
    }

    #[tokio::test]
    async fn discover_fully_explored_is_empty() {
        let analytics = seeded(&[
            ("other", "a"),
            ("other", "b"),
            ("c1", "a"),
            ("c1", "b"),
        ])
        .await;
        assert_eq!(
            analytics.discover("c1").await.unwrap(),
            DiscoverView::NothingToDiscover
        );
    }

    #[tokio::test]
    async fn discover_without_any_history_is_empty() {
        let analytics = seeded(&[]).await;
        assert_eq!(
            analytics.discover("c1").await.unwrap(),
            DiscoverView::NothingToDiscover
        );
    }

    #[tokio::test]
    async fn empty_views_are_not_errors() {
        let analytics = seeded(&[]).await;
        assert_eq!(analytics.history("c1", 3).await.unwrap(), HistoryView::Empty);
        assert_eq!(analytics.my_topics("c1").await.unwrap(), TopicsView::Empty);
        assert_eq!(analytics.trending().await.unwrap(), TopicsView::Empty);
    }

    #[tokio::test]
    async fn my_topics_caps_at_five() {
        let analytics = seeded(&[
            ("c", "a"),
            ("c", "b"),
            ("c", "c"),
            ("c", "d"),
            ("c", "e"),
            ("c", "f"),
        ])
        .await;
        let TopicsView::Ranked(counts) = analytics.my_topics("c").await.unwrap() else {
            panic!("expected ranked topics");
        };
        assert_eq!(counts.len(), 5);
    }

    #[tokio::test]
    async fn renders_history_newest_first() {
        let analytics = seeded(&[("42", "india"), ("42", "sports")]).await;
        let text = render_history(&analytics.history("42", 2).await.unwrap());

        assert!(text.starts_with("Your last 2 news requests:"));
        let sports = text.find("Topic: sports").unwrap();
        let india = text.find("Topic: india").unwrap();
        assert!(sports < india);
        assert!(text.contains("Summary: summary for sports..."));
    }

    #[test]
    fn renders_ranked_topics() {
        let view = TopicsView::Ranked(vec![TopicCount::new("india", 2), TopicCount::new("sports", 1)]);
        assert_eq!(
            render_my_topics(&view),
            "Your top requested news topics:\n1. india (2 times)\n2. sports (1 times)"
        );
        assert_eq!(
            render_trending(&view),
            "Top trending news topics (all users):\n1. india (2 requests)\n2. sports (1 requests)"
        );
    }

    #[test]
    fn renders_discover_states() {
        assert!(render_discover(&DiscoverView::NothingToDiscover).contains("already explored"));
        let text = render_discover(&DiscoverView::Unexplored(vec!["space".to_string()]));
        assert!(text.contains("1. space"));
        assert!(text.ends_with("Try /news <topic> to read about these!"));
    }
}
