use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;

pub const STATUS_TEXT: &str = "✅ Telegram Bot is running!";

/// GET / liveness check for the hosting platform.
async fn status() -> &'static str {
    STATUS_TEXT
}

pub fn router() -> Router {
    Router::new().route("/", get(status))
}

/// Serves the status route on `0.0.0.0:<port>` until the task is dropped.
pub async fn serve(port: u16) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Status endpoint listening on {}", listener.local_addr()?);
    serve_on(listener).await
}

pub async fn serve_on(listener: TcpListener) -> Result<()> {
    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_reports_running() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_on(listener));

        let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), STATUS_TEXT);

        let missing = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        server.abort();
    }
}
