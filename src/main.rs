use std::sync::Arc;

use tokio::sync::mpsc;

use news_digest::ai::GeminiSummarizer;
use news_digest::bot::Bot;
use news_digest::config::Config;
use news_digest::db::Repository;
use news_digest::error::Result;
use news_digest::health;
use news_digest::news::GNewsClient;
use news_digest::telegram::{run_dispatcher, run_polling, TelegramClient};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;
    let token = config.require_bot_token()?;

    let repository = Repository::new(&config.db_path).await?;
    tracing::info!("Using database at {}", config.db_path);

    if config.gnews_api_key.is_none() {
        tracing::warn!("GNEWS_API_KEY is not set; /news will report an error");
    }
    if config.gemini_api_key.is_none() {
        tracing::warn!("GOOGLE_API_KEY is not set; summaries will fail");
    }

    let telegram = TelegramClient::new(token, config.poll_timeout_secs)?;
    let (outbox_tx, outbox_rx) = mpsc::channel(256);

    let bot = Arc::new(Bot::new(
        repository.clone(),
        Arc::new(GNewsClient::new(&config)?),
        Arc::new(GeminiSummarizer::new(&config)?),
        config.broadcast_channel().map(str::to_string),
        outbox_tx,
    ));

    let dispatcher = tokio::spawn(run_dispatcher(telegram.clone(), outbox_rx));

    let port = config.port;
    let status_server = tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            tracing::error!("Status endpoint stopped: {}", e);
        }
    });

    tracing::info!("Bot is initialized and ready to poll");
    tokio::select! {
        _ = run_polling(telegram, Arc::clone(&bot), config.poll_timeout_secs) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    // Let queued replies go out before exiting.
    drop(bot);
    let _ = dispatcher.await;
    status_server.abort();

    if let Err(e) = repository.close().await {
        tracing::warn!("Database did not close cleanly: {}", e);
    }

    Ok(())
}
