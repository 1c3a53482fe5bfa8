use crate::gateway::{BotGateway, Incoming, Keyboard, Update};
use crate::session::ChatId;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

const API_BASE: &str = "https://api.telegram.org";

/// Seconds a `getUpdates` call may block server-side.
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<RawMessage>,
    callback_query: Option<RawCallback>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RawCallback {
    id: String,
    data: Option<String>,
    message: Option<RawMessage>,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let incoming = match (raw.message, raw.callback_query) {
            (Some(RawMessage { chat, text: Some(text) }), _) => Some(Incoming::Message {
                chat: chat.id,
                text,
            }),
            (_, Some(cb)) => match (cb.message, cb.data) {
                (Some(message), Some(data)) => Some(Incoming::Callback {
                    id: cb.id,
                    chat: message.chat.id,
                    data,
                }),
                _ => None,
            },
            _ => None,
        };
        Update {
            id: raw.update_id,
            incoming,
        }
    }
}

fn keyboard_markup(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.text, "callback_data": b.callback_data }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

/// Telegram Bot API client over HTTPS.
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 90))
            .build()?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", API_BASE, token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> anyhow::Result<T> {
        let res = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(&body)
            .send()
            .await?;
        Self::unwrap_response(method, res).await
    }

    async fn unwrap_response<T: DeserializeOwned>(method: &str, res: reqwest::Response) -> anyhow::Result<T> {
        let status = res.status();
        let parsed: ApiResponse<T> = res.json().await?;
        if !parsed.ok {
            anyhow::bail!(
                "{} failed ({}): {}",
                method,
                status,
                parsed.description.unwrap_or_default()
            );
        }
        parsed
            .result
            .ok_or_else(|| anyhow::anyhow!("{} returned no result", method))
    }
}

impl BotGateway for TelegramClient {
    async fn poll(&self, offset: i64) -> anyhow::Result<Vec<Update>> {
        let raw: Vec<RawUpdate> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;
        if !raw.is_empty() {
            debug!("Received {} updates", raw.len());
        }
        Ok(raw.into_iter().map(Update::from).collect())
    }

    async fn send_message(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        let _: Value = self
            .call("sendMessage", json!({ "chat_id": chat, "text": text }))
            .await?;
        Ok(())
    }

    async fn send_keyboard(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> anyhow::Result<()> {
        let _: Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat,
                    "text": text,
                    "reply_markup": keyboard_markup(keyboard),
                }),
            )
            .await?;
        Ok(())
    }

    async fn send_video(&self, chat: ChatId, video: Vec<u8>) -> anyhow::Result<()> {
        let size = video.len();
        let part = Part::bytes(video)
            .file_name("video.mp4")
            .mime_str("video/mp4")?;
        let form = Form::new()
            .text("chat_id", chat.to_string())
            .text("supports_streaming", "true")
            .part("video", part);
        let res = self
            .client
            .post(format!("{}/sendVideo", self.base))
            .multipart(form)
            .send()
            .await?;
        let _: Value = Self::unwrap_response("sendVideo", res).await?;
        info!(chat, "Uploaded {} byte video", size);
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> anyhow::Result<()> {
        let _: Value = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_id }),
            )
            .await?;
        Ok(())
    }
}
