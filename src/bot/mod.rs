mod command;
mod handler;
mod markdown;

use serde::Serialize;

pub use command::{normalize_keyword, normalize_topic, Command, DEFAULT_TOPIC};
pub use handler::Bot;
pub use markdown::{escape_markdown, escape_markdown_v2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
}

/// A message for the transport to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

impl OutboundMessage {
    pub fn plain(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn formatted(chat_id: impl Into<String>, text: impl Into<String>, mode: ParseMode) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: Some(mode),
        }
    }
}
