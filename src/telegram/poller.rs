use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::bot::{Bot, OutboundMessage};

use super::TelegramClient;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls for updates forever, handling each one on its own task.
pub async fn run_polling(client: TelegramClient, bot: Arc<Bot>, timeout_secs: u64) {
    let mut offset = 0;
    tracing::info!("Polling Telegram for updates");

    loop {
        let updates = match client.get_updates(offset, timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}", e);
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some((chat_id, text)) = update.text_message() else {
                continue;
            };
            let text = text.to_string();
            let bot = Arc::clone(&bot);
            tokio::spawn(async move {
                bot.handle_text(&chat_id, &text).await;
            });
        }
    }
}

/// Delivers queued messages until every sender is dropped.
pub async fn run_dispatcher(client: TelegramClient, mut outbox: mpsc::Receiver<OutboundMessage>) {
    while let Some(message) = outbox.recv().await {
        if let Err(e) = client.send_message(&message).await {
            tracing::error!("Failed to deliver message to chat {}: {}", message.chat_id, e);
        }
    }
    tracing::debug!("Outbound queue closed");
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn dispatcher_drains_queue_and_survives_failures() {
        let server = MockServer::start();
        let failing = server.mock(|when, then| {
            when.method(POST)
                .path("/sendMessage")
                .json_body_partial(r#"{"chat_id": "bad"}"#);
            then.status(403)
                .json_body(json!({"ok": false, "description": "Forbidden: bot was blocked by the user"}));
        });
        let ok = server.mock(|when, then| {
            when.method(POST)
                .path("/sendMessage")
                .json_body_partial(r#"{"chat_id": "good"}"#);
            then.status(200).json_body(json!({"ok": true, "result": {}}));
        });

        let client = TelegramClient::with_base_url(&server.base_url(), 0).unwrap();
        let (tx, rx) = mpsc::channel(8);
        tx.send(OutboundMessage::plain("bad", "one")).await.unwrap();
        tx.send(OutboundMessage::plain("good", "two")).await.unwrap();
        tx.send(OutboundMessage::plain("good", "three")).await.unwrap();
        drop(tx);

        run_dispatcher(client, rx).await;

        failing.assert_hits(1);
        ok.assert_hits(2);
    }
}
