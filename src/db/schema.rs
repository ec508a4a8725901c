pub const SCHEMA: &str = r#"
-- interactions table (append-only request log)
CREATE TABLE IF NOT EXISTS interactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id TEXT NOT NULL,
    input_topic TEXT NOT NULL,
    news_data TEXT NOT NULL,
    summary TEXT NOT NULL,
    timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_interactions_chat_ts ON interactions(chat_id, timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_interactions_topic ON interactions(input_topic);

-- alerts table (keyword subscriptions, duplicates allowed)
CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id TEXT NOT NULL,
    keyword TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerts_chat_keyword ON alerts(chat_id, keyword);
"#;
