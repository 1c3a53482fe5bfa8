use crate::session::ChatId;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<InlineButton>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Message {
        chat: ChatId,
        text: String,
    },
    Callback {
        id: String,
        chat: ChatId,
        data: String,
    },
}

impl Incoming {
    pub fn chat(&self) -> ChatId {
        match self {
            Incoming::Message { chat, .. } | Incoming::Callback { chat, .. } => *chat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub id: i64,
    /// `None` for update kinds the bot does not handle.
    pub incoming: Option<Incoming>,
}

/// Messaging transport the bot talks through.
pub trait BotGateway: Send + Sync + 'static {
    /// Long-poll for updates with ids `>= offset`.
    fn poll(&self, offset: i64) -> impl Future<Output = anyhow::Result<Vec<Update>>> + Send;

    fn send_message(&self, chat: ChatId, text: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn send_keyboard(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: &Keyboard,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn send_video(&self, chat: ChatId, video: Vec<u8>) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn answer_callback(&self, callback_id: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}
