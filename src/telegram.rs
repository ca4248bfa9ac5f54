//! Telegram alert transport. Out of scope per spec.md §1 ("interfaces
//! only"); notifications are push-style and fire-and-forget — a failure
//! here must never affect the relay path (spec.md §7).

use serde::Serialize;

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
}

/// Sends `message` to the configured Telegram chat. Errors are logged and
/// swallowed; callers never need to handle a failure here.
pub async fn send_telegram_message(identity: &str, bot_id: &str, chat_id: &str, message: &str) {
    if bot_id.is_empty() || chat_id.is_empty() {
        return;
    }

    let url = format!("https://api.telegram.org/bot{bot_id}/sendMessage");
    let body = SendMessageRequest {
        chat_id,
        text: format!("[{identity}] {message}"),
    };

    let client = reqwest::Client::new();
    if let Err(err) = client.post(&url).json(&body).send().await {
        tracing::warn!(%err, "failed to deliver telegram alert");
    }
}
