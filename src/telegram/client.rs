use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::bot::{OutboundMessage, ParseMode};
use crate::error::{AppError, Result};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Chat id (as a string) and text of a text message, if this update has one.
    pub fn text_message(&self) -> Option<(String, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((message.chat.id.to_string(), text))
    }
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str, poll_timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(&format!("{}/bot{}", TELEGRAM_API_URL, token), poll_timeout_secs)
    }

    pub fn with_base_url(base_url: &str, poll_timeout_secs: u64) -> Result<Self> {
        // Long polls hold the request open for `poll_timeout_secs`.
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let api_response: ApiResponse<T> = response.json().await?;

        if !api_response.ok {
            return Err(AppError::Telegram(format!(
                "{} failed ({}): {}",
                method,
                status.as_u16(),
                api_response.description.unwrap_or_default()
            )));
        }

        api_response
            .result
            .ok_or_else(|| AppError::Telegram(format!("{} returned no result", method)))
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };
        self.call("getUpdates", &request).await
    }

    pub async fn send_message(&self, message: &OutboundMessage) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: &message.chat_id,
            text: &message.text,
            parse_mode: message.parse_mode,
        };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn parses_updates() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/getUpdates")
                .json_body_partial(r#"{"offset": 10, "timeout": 0}"#);
            then.status(200).json_body(json!({
                "ok": true,
                "result": [
                    {"update_id": 10, "message": {"message_id": 1, "chat": {"id": -42, "type": "group"}, "text": "/news ai"}},
                    {"update_id": 11, "message": {"message_id": 2, "chat": {"id": 7, "type": "private"}}},
                    {"update_id": 12, "edited_message": {"message_id": 3}}
                ]
            }));
        });

        let client = TelegramClient::with_base_url(&server.base_url(), 0).unwrap();
        let updates = client.get_updates(10, 0).await.unwrap();

        mock.assert();
        assert_eq!(updates.len(), 3);
        assert_eq!(
            updates[0].text_message(),
            Some(("-42".to_string(), "/news ai"))
        );
        assert_eq!(updates[1].text_message(), None);
        assert_eq!(updates[2].text_message(), None);
    }

    #[tokio::test]
    async fn sends_parse_mode_only_when_set() {
        let server = MockServer::start();
        let formatted = server.mock(|when, then| {
            when.method(POST)
                .path("/sendMessage")
                .json_body(json!({"chat_id": "42", "text": "*hi*", "parse_mode": "MarkdownV2"}));
            then.status(200).json_body(json!({"ok": true, "result": {"message_id": 1}}));
        });
        let plain = server.mock(|when, then| {
            when.method(POST)
                .path("/sendMessage")
                .json_body(json!({"chat_id": "42", "text": "hi"}));
            then.status(200).json_body(json!({"ok": true, "result": {"message_id": 2}}));
        });

        let client = TelegramClient::with_base_url(&server.base_url(), 0).unwrap();
        client
            .send_message(&OutboundMessage::formatted("42", "*hi*", ParseMode::MarkdownV2))
            .await
            .unwrap();
        client
            .send_message(&OutboundMessage::plain("42", "hi"))
            .await
            .unwrap();

        formatted.assert();
        plain.assert();
    }

    #[tokio::test]
    async fn api_errors_carry_description() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/sendMessage");
            then.status(400).json_body(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: can't parse entities"
            }));
        });

        let client = TelegramClient::with_base_url(&server.base_url(), 0).unwrap();
        let err = client
            .send_message(&OutboundMessage::plain("42", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Telegram(ref msg) if msg.contains("can't parse entities")));
    }
}
