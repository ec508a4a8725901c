use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Interaction, NewInteraction, Subscription, TopicCount};

use super::schema::SCHEMA;

/// SQLite's own `YYYY-MM-DD HH:MM:SS` layout with a fixed-width fraction, so
/// stored text sorts in time order alongside `CURRENT_TIMESTAMP` rows.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Single owner of the SQLite connection.
///
/// Every method is one self-contained statement executed on the connection's
/// worker thread, so clones can be shared freely between concurrent tasks.
#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Shuts down the connection's worker thread. Every clone of this
    /// repository fails with `StorageUnavailable` afterwards.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    // Interaction operations

    pub async fn append(&self, interaction: NewInteraction) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
                conn.execute(
                    "INSERT INTO interactions (chat_id, input_topic, news_data, summary, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        interaction.chat_id,
                        interaction.input_topic,
                        interaction.news_data,
                        interaction.summary,
                        timestamp,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        tracing::debug!("Stored interaction {}", id);
        Ok(id)
    }

    /// Most recent interactions for a chat, newest first.
    pub async fn recent(&self, chat_id: &str, limit: usize) -> Result<Vec<Interaction>> {
        let chat_id = chat_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let interactions = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, chat_id, input_topic, news_data, summary, timestamp
                       FROM interactions
                       WHERE chat_id = ?1
                       ORDER BY timestamp DESC, id DESC
                       LIMIT ?2"#,
                )?;
                let rows = stmt
                    .query_map(params![chat_id, limit], interaction_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(interactions)
    }

    /// Topic counts for one chat, most requested first.
    pub async fn topic_frequency(&self, chat_id: &str, top_n: usize) -> Result<Vec<TopicCount>> {
        let chat_id = chat_id.to_string();
        let top_n = i64::try_from(top_n).unwrap_or(i64::MAX);
        let counts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT input_topic, COUNT(*) AS count
                       FROM interactions
                       WHERE chat_id = ?1
                       GROUP BY input_topic
                       ORDER BY count DESC, MIN(id) ASC
                       LIMIT ?2"#,
                )?;
                let rows = stmt
                    .query_map(params![chat_id, top_n], topic_count_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(counts)
    }

    /// Topic counts across every chat, most requested first.
    pub async fn global_topic_frequency(&self, top_n: usize) -> Result<Vec<TopicCount>> {
        let top_n = i64::try_from(top_n).unwrap_or(i64::MAX);
        let counts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT input_topic, COUNT(*) AS count
                       FROM interactions
                       GROUP BY input_topic
                       ORDER BY count DESC, MIN(id) ASC
                       LIMIT ?1"#,
                )?;
                let rows = stmt
                    .query_map(params![top_n], topic_count_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(counts)
    }

    pub async fn distinct_topics(&self, chat_id: &str) -> Result<BTreeSet<String>> {
        let chat_id = chat_id.to_string();
        let topics = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT DISTINCT input_topic FROM interactions WHERE chat_id = ?1")?;
                let rows = stmt
                    .query_map(params![chat_id], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<BTreeSet<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(topics)
    }

    // Alert subscription operations

    pub async fn subscribe(&self, chat_id: &str, keyword: &str) -> Result<i64> {
        let chat_id = chat_id.to_string();
        let keyword = keyword.to_string();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO alerts (chat_id, keyword) VALUES (?1, ?2)",
                    params![chat_id, keyword],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Removes every row for the pair and returns how many went away.
    pub async fn unsubscribe(&self, chat_id: &str, keyword: &str) -> Result<usize> {
        let chat_id = chat_id.to_string();
        let keyword = keyword.to_string();
        let removed = self
            .conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM alerts WHERE chat_id = ?1 AND keyword = ?2",
                    params![chat_id, keyword],
                )?;
                Ok(removed)
            })
            .await?;
        Ok(removed)
    }

    pub async fn list_for_chat(&self, chat_id: &str) -> Result<Vec<String>> {
        let chat_id = chat_id.to_string();
        let keywords = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT keyword FROM alerts WHERE chat_id = ?1 ORDER BY id")?;
                let rows = stmt
                    .query_map(params![chat_id], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(keywords)
    }

    /// Distinct (chat, keyword) pairs in order of first subscription.
    pub async fn all_subscriptions(&self) -> Result<Vec<Subscription>> {
        let subscriptions = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT chat_id, keyword
                       FROM alerts
                       GROUP BY chat_id, keyword
                       ORDER BY MIN(id)"#,
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(Subscription {
                            chat_id: row.get(0)?,
                            keyword: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(subscriptions)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // %.f also accepts rows written by SQLite's CURRENT_TIMESTAMP default
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn interaction_from_row(row: &Row) -> rusqlite::Result<Interaction> {
    let raw_timestamp: String = row.get(5)?;
    let timestamp = parse_datetime(&raw_timestamp).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("invalid timestamp {raw_timestamp:?}").into(),
        )
    })?;

    Ok(Interaction {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        input_topic: row.get(2)?,
        news_data: row.get(3)?,
        summary: row.get(4)?,
        timestamp,
    })
}

fn topic_count_from_row(row: &Row) -> rusqlite::Result<TopicCount> {
    let count: i64 = row.get(1)?;
    Ok(TopicCount {
        topic: row.get(0)?,
        count: count.max(0) as u64,
    })
}
