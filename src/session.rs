use crate::verses::VerseRange;
use std::collections::HashMap;
use std::sync::Mutex;

pub type ChatId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardState {
    #[default]
    Start,
    AwaitingChapter,
    AwaitingVerseRange,
    AwaitingReciter,
    Rendering,
}

/// Wizard progress for one chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: WizardState,
    pub chapter: Option<u32>,
    pub range: Option<VerseRange>,
    pub reciter: Option<String>,
}

/// Per-chat session storage. Sessions of different chats never share state.
pub trait SessionStore: Send + Sync + 'static {
    /// Run `f` against the chat's session, creating it on first contact.
    fn with_session<T>(&self, chat: ChatId, f: impl FnOnce(&mut Session) -> T) -> T;

    fn reset(&self, chat: ChatId) {
        self.with_session(chat, |s| *s = Session::default());
    }

    fn snapshot(&self, chat: ChatId) -> Session {
        self.with_session(chat, |s| s.clone())
    }
}

/// Sessions kept in process memory; lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<ChatId, Session>>,
}

impl SessionStore for MemorySessionStore {
    fn with_session<T>(&self, chat: ChatId, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        f(sessions.entry(chat).or_default())
    }
}
