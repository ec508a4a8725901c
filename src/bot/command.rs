use crate::error::{AppError, Result};

/// Topic used when `/news` is sent without arguments.
pub const DEFAULT_TOPIC: &str = "india";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    News(Vec<String>),
    History(Option<String>),
    MyTopics,
    Trending,
    Discover,
    Alert(Vec<String>),
    Alerts,
    RemoveAlert(Vec<String>),
}

impl Command {
    /// Parses `/name[@bot] args...`. Returns `None` for plain text and
    /// commands this bot does not know.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let args: Vec<String> = parts.map(str::to_string).collect();

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "news" => Command::News(args),
            "history" => Command::History(args.into_iter().next()),
            "mytopics" => Command::MyTopics,
            "trending" => Command::Trending,
            "discover" => Command::Discover,
            "alert" => Command::Alert(args),
            "alerts" => Command::Alerts,
            "removealert" => Command::RemoveAlert(args),
            _ => return None,
        };
        Some(command)
    }
}

/// Lower-cased, trimmed topic, falling back to [`DEFAULT_TOPIC`].
pub fn normalize_topic(args: &[String]) -> String {
    let topic = args.join(" ").trim().to_lowercase();
    if topic.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        topic
    }
}

/// Lower-cased, trimmed subscription keyword. Empty input is rejected.
pub fn normalize_keyword(args: &[String]) -> Result<String> {
    let keyword = args.join(" ").trim().to_lowercase();
    if keyword.is_empty() {
        return Err(AppError::Validation("keyword must not be empty".to_string()));
    }
    Ok(keyword)
}
