use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::db::Repository;
use crate::error::Result;
use crate::models::{Notification, Subscription};

/// Case-insensitive whole-word matcher for a literal keyword.
pub fn keyword_pattern(keyword: &str) -> Option<Regex> {
    let pattern = format!(r"\b{}\b", regex::escape(keyword));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Skipping alert keyword {:?}: {}", keyword, e);
            None
        }
    }
}

/// Walks subscriptions in order and notifies each chat at most once, for the
/// first of its keywords found in `text`.
pub fn match_subscriptions(subscriptions: &[Subscription], text: &str) -> Vec<Notification> {
    let mut notified: HashSet<&str> = HashSet::new();
    let mut notifications = Vec::new();

    for sub in subscriptions {
        if sub.keyword.is_empty() || notified.contains(sub.chat_id.as_str()) {
            continue;
        }
        let Some(re) = keyword_pattern(&sub.keyword) else {
            continue;
        };
        if re.is_match(text) {
            notified.insert(sub.chat_id.as_str());
            notifications.push(Notification {
                chat_id: sub.chat_id.clone(),
                keyword: sub.keyword.clone(),
            });
        }
    }

    notifications
}

/// Decides which chats to alert for a block of freshly fetched news.
/// Delivery belongs to the caller.
#[derive(Clone)]
pub struct Matcher {
    repository: Repository,
}

impl Matcher {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn scan(&self, text: &str) -> Result<Vec<Notification>> {
        let subscriptions = self.repository.all_subscriptions().await?;
        let notifications = match_subscriptions(&subscriptions, text);
        tracing::debug!(
            "Matched {} of {} subscriptions",
            notifications.len(),
            subscriptions.len()
        );
        Ok(notifications)
    }
}
