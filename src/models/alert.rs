use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscription {
    pub chat_id: String,
    pub keyword: String,
}

impl Subscription {
    pub fn new(chat_id: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            keyword: keyword.into(),
        }
    }
}

/// Decision that `chat_id` should be told `keyword` showed up in fresh news.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub chat_id: String,
    pub keyword: String,
}

impl Notification {
    pub fn message(&self) -> String {
        format!(
            "🔔 ALERT: The keyword '{}' appears in the latest news!",
            self.keyword
        )
    }
}
