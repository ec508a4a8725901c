use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered `/news` request. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub id: i64,
    pub chat_id: String,
    pub input_topic: String,
    pub news_data: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

/// Caller-supplied half of an [`Interaction`]; the store assigns `id` and `timestamp`.
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub chat_id: String,
    pub input_topic: String,
    pub news_data: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicCount {
    pub topic: String,
    pub count: u64,
}

impl TopicCount {
    pub fn new(topic: impl Into<String>, count: u64) -> Self {
        Self {
            topic: topic.into(),
            count,
        }
    }
}
