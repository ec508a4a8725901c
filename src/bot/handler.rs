use std::sync::Arc;

use tokio::sync::mpsc;

use crate::ai::{is_summary_failure, Summarize};
use crate::alerts::Matcher;
use crate::analytics::{self, Analytics};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::NewInteraction;
use crate::news::{is_fetch_failure, NewsSource};

use super::command::{normalize_keyword, normalize_topic, Command};
use super::markdown::{escape_markdown, escape_markdown_v2};
use super::{OutboundMessage, ParseMode};

const MAX_DIGEST_CHARS: usize = 4000;
const TRUNCATED_DIGEST_CHARS: usize = 3990;
const MAX_TOPIC_CHARS: usize = 100;

const HELP_TEXT: &str = "I summarize the news and remember what you asked for.

/news <topic> - AI digest for a topic or category (default: india)
/history [n] - your last n requests (default 3)
/mytopics - topics you ask about most
/trending - most requested topics across all users
/discover - trending topics you haven't read yet
/alert <keyword> - get notified when a keyword shows up in the news
/alerts - list your alert keywords
/removealert <keyword> - stop alerts for a keyword";

/// Command handlers. Replies are pushed onto the outbox in the order they
/// should be delivered.
pub struct Bot {
    repository: Repository,
    matcher: Matcher,
    analytics: Analytics,
    news: Arc<dyn NewsSource>,
    summarizer: Arc<dyn Summarize>,
    broadcast_channel: Option<String>,
    outbox: mpsc::Sender<OutboundMessage>,
}

impl Bot {
    pub fn new(
        repository: Repository,
        news: Arc<dyn NewsSource>,
        summarizer: Arc<dyn Summarize>,
        broadcast_channel: Option<String>,
        outbox: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        Self {
            matcher: Matcher::new(repository.clone()),
            analytics: Analytics::new(repository.clone()),
            repository,
            news,
            summarizer,
            broadcast_channel,
            outbox,
        }
    }

    /// Entry point for one inbound message. Failures are reported to the
    /// chat and never escape, so one bad update cannot stop the others.
    pub async fn handle_text(&self, chat_id: &str, text: &str) {
        let Some(command) = Command::parse(text) else {
            return;
        };
        tracing::debug!("chat {} -> {:?}", chat_id, command);

        if let Err(e) = self.handle(chat_id, command).await {
            tracing::error!("Command failed for chat {}: {}", chat_id, e);
            let reply = match e {
                AppError::StorageUnavailable(_) => {
                    "⚠️ Sorry, I couldn't reach my memory right now. Please try again later."
                }
                _ => "⚠️ Sorry, something went wrong handling that command.",
            };
            if let Err(e) = self.send(OutboundMessage::plain(chat_id, reply)).await {
                tracing::warn!("Could not report failure to chat {}: {}", chat_id, e);
            }
        }
    }

    pub async fn handle(&self, chat_id: &str, command: Command) -> Result<()> {
        match command {
            Command::Start | Command::Help => self.reply(chat_id, HELP_TEXT).await,
            Command::News(args) => self.news(chat_id, &normalize_topic(&args)).await,
            Command::History(arg) => {
                let limit = analytics::history_limit(arg.as_deref());
                let view = self.analytics.history(chat_id, limit).await?;
                self.reply(chat_id, analytics::render_history(&view)).await
            }
            Command::MyTopics => {
                let view = self.analytics.my_topics(chat_id).await?;
                self.reply(chat_id, analytics::render_my_topics(&view)).await
            }
            Command::Trending => {
                let view = self.analytics.trending().await?;
                self.reply(chat_id, analytics::render_trending(&view)).await
            }
            Command::Discover => {
                let view = self.analytics.discover(chat_id).await?;
                self.reply(chat_id, analytics::render_discover(&view)).await
            }
            Command::Alert(args) => self.subscribe(chat_id, &args).await,
            Command::Alerts => self.list_alerts(chat_id).await,
            Command::RemoveAlert(args) => self.unsubscribe(chat_id, &args).await,
        }
    }

    async fn news(&self, chat_id: &str, topic: &str) -> Result<()> {
        let display_topic = display_topic(topic);
        self.send(OutboundMessage::formatted(
            chat_id,
            format!(
                "🔍 Searching GNews and summarizing news for *{}*...",
                escape_markdown(&display_topic)
            ),
            ParseMode::Markdown,
        ))
        .await?;

        let news_data = self.news.fetch(topic).await;
        if is_fetch_failure(&news_data) {
            return self.reply(chat_id, news_data).await;
        }

        // Alerts go out before summarization so a failed summary still notifies.
        match self.matcher.scan(&news_data).await {
            Ok(notifications) => {
                for notification in notifications {
                    let message = notification.message();
                    self.send(OutboundMessage::plain(notification.chat_id, message))
                        .await?;
                }
            }
            Err(e) => tracing::error!("Alert matching failed: {}", e),
        }

        let summary = self.summarizer.summarize(&news_data).await;
        if is_summary_failure(&summary) {
            return self.reply(chat_id, summary).await;
        }

        let digest = format_digest(&display_topic, &summary);
        self.send(OutboundMessage::formatted(
            chat_id,
            digest.clone(),
            ParseMode::MarkdownV2,
        ))
        .await?;

        if let Some(channel) = &self.broadcast_channel {
            self.send(OutboundMessage::formatted(
                channel.as_str(),
                digest,
                ParseMode::MarkdownV2,
            ))
            .await?;
        }

        let record = NewInteraction {
            chat_id: chat_id.to_string(),
            input_topic: topic.to_string(),
            news_data,
            summary,
        };
        if let Err(e) = self.repository.append(record).await {
            tracing::error!("Failed to log interaction for chat {}: {}", chat_id, e);
            self.reply(
                chat_id,
                "⚠️ Your digest was delivered but couldn't be saved to your history.",
            )
            .await?;
        }

        Ok(())
    }

    async fn subscribe(&self, chat_id: &str, args: &[String]) -> Result<()> {
        let keyword = match normalize_keyword(args) {
            Ok(keyword) => keyword,
            Err(AppError::Validation(_)) => {
                return self
                    .reply(
                        chat_id,
                        "Please provide a keyword to subscribe to alerts (e.g., /alert AI)",
                    )
                    .await
            }
            Err(e) => return Err(e),
        };

        self.repository.subscribe(chat_id, &keyword).await?;
        tracing::info!("chat {} subscribed to {:?}", chat_id, keyword);
        self.reply(
            chat_id,
            format!(
                "Alert set! You'll be notified when '{}' appears in future news.",
                keyword
            ),
        )
        .await
    }

    async fn list_alerts(&self, chat_id: &str) -> Result<()> {
        let keywords = self.repository.list_for_chat(chat_id).await?;
        if keywords.is_empty() {
            return self
                .reply(
                    chat_id,
                    "You don't have any active alerts. Set one using /alert <keyword>!",
                )
                .await;
        }

        let mut lines = vec!["Your active alert keywords:".to_string()];
        lines.extend(
            keywords
                .iter()
                .enumerate()
                .map(|(i, keyword)| format!("{}. {}", i + 1, keyword)),
        );
        self.reply(chat_id, lines.join("\n")).await
    }

    async fn unsubscribe(&self, chat_id: &str, args: &[String]) -> Result<()> {
        let Ok(keyword) = normalize_keyword(args) else {
            return self
                .reply(chat_id, "Specify the keyword to remove: /removealert <keyword>")
                .await;
        };

        let removed = self.repository.unsubscribe(chat_id, &keyword).await?;
        let text = if removed > 0 {
            format!("Removed alert for '{}'.", keyword)
        } else {
            format!("No alert found for '{}'.", keyword)
        };
        self.reply(chat_id, text).await
    }

    async fn reply(&self, chat_id: &str, text: impl Into<String>) -> Result<()> {
        self.send(OutboundMessage::plain(chat_id, text)).await
    }

    async fn send(&self, message: OutboundMessage) -> Result<()> {
        self.outbox
            .send(message)
            .await
            .map_err(|_| AppError::Telegram("outbound queue closed".to_string()))
    }
}

fn display_topic(topic: &str) -> String {
    if topic == "top" {
        return "Top Headlines".to_string();
    }
    let mut chars = topic.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// MarkdownV2 digest message, cut down to Telegram's length limit.
///
/// Only the summary is shortened; the topic is capped up front so the bold
/// header entity always survives intact.
fn format_digest(display_topic: &str, summary: &str) -> String {
    let topic: String = display_topic.chars().take(MAX_TOPIC_CHARS).collect();
    let header = format!("AI News Digest: *{}*\n\n", escape_markdown_v2(&topic));
    let body = escape_markdown_v2(summary);

    let header_chars = header.chars().count();
    if header_chars + body.chars().count() <= MAX_DIGEST_CHARS {
        return header + &body;
    }

    let budget = TRUNCATED_DIGEST_CHARS.saturating_sub(header_chars);
    let mut truncated: String = body.chars().take(budget).collect();
    // A lone trailing backslash would escape the ellipsis.
    let trailing_backslashes = truncated.chars().rev().take_while(|c| *c == '\\').count();
    if trailing_backslashes % 2 == 1 {
        truncated.pop();
    }
    truncated.push_str(r"\.\.\.");
    header + &truncated
}
