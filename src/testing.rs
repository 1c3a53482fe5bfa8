//! In-memory collaborators shared by the controller and supervisor tests.

use crate::audit::AuditLog;
use crate::config::{Reciter, Strings};
use crate::conversation::Controller;
use crate::error::RenderError;
use crate::gateway::{BotGateway, Keyboard, Update};
use crate::render::{RenderJob, RenderPool, VideoRenderer};
use crate::session::{ChatId, MemorySessionStore};
use crate::verses::{Chapter, VerseStore};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(ChatId, String),
    Keyboard(ChatId, String, Keyboard),
    Video(ChatId, Vec<u8>),
    Answer(String),
}

#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<Sent>>,
    updates: Mutex<VecDeque<anyhow::Result<Vec<Update>>>>,
    pub fail_sends: bool,
}

impl RecordingGateway {
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn queue_updates(&self, batch: anyhow::Result<Vec<Update>>) {
        self.updates.lock().unwrap().push_back(batch);
    }

    fn record(&self, sent: Sent) -> anyhow::Result<()> {
        if self.fail_sends {
            anyhow::bail!("transport down");
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

impl BotGateway for RecordingGateway {
    async fn poll(&self, _offset: i64) -> anyhow::Result<Vec<Update>> {
        let next = self.updates.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        self.record(Sent::Text(chat, text.to_string()))
    }

    async fn send_keyboard(&self, chat: ChatId, text: &str, keyboard: &Keyboard) -> anyhow::Result<()> {
        self.record(Sent::Keyboard(chat, text.to_string(), keyboard.clone()))
    }

    async fn send_video(&self, chat: ChatId, video: Vec<u8>) -> anyhow::Result<()> {
        self.record(Sent::Video(chat, video))
    }

    async fn answer_callback(&self, callback_id: &str) -> anyhow::Result<()> {
        self.record(Sent::Answer(callback_id.to_string()))
    }
}

/// Echoes the reciter folder back as the "video" and remembers every job.
pub struct FakeRenderer {
    pub jobs: Arc<Mutex<Vec<RenderJob>>>,
    pub fail: bool,
}

impl VideoRenderer for FakeRenderer {
    fn render(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError> {
        self.jobs.lock().unwrap().push(job.clone());
        if self.fail {
            return Err(RenderError::NoAudio {
                chapter: job.chapter,
                start: job.range.start,
                end: job.range.end,
            });
        }
        Ok(job.reciter_folder.as_bytes().to_vec())
    }
}

pub fn test_strings() -> Strings {
    Strings {
        select_surah: "select_surah".into(),
        select_ayah: "ayah for {placeholder}".into(),
        select_reciter: "select_reciter".into(),
        error_surah: "error_surah".into(),
        error_ayah: "error_ayah".into(),
        error_reciter: "error_reciter".into(),
        error_range: "error_range".into(),
        generating: "generating with {placeholder}".into(),
        feedback_prompt: "feedback".into(),
        busy: "busy".into(),
        render_failed: "render_failed".into(),
        reciters: vec![
            Reciter {
                name: "Yassin".into(),
                folder: "warsh_yassin".into(),
            },
            Reciter {
                name: "Husary".into(),
                folder: "husary".into(),
            },
        ],
    }
}

pub struct Harness {
    pub gateway: Arc<RecordingGateway>,
    pub sessions: Arc<MemorySessionStore>,
    pub strings: Arc<Strings>,
    jobs: Arc<Mutex<Vec<RenderJob>>>,
    fail_render: bool,
    dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> anyhow::Result<Self> {
        Self::build(RecordingGateway::default(), false)
    }

    pub fn failing() -> anyhow::Result<Self> {
        Self::build(RecordingGateway::default(), true)
    }

    pub fn with_gateway(gateway: RecordingGateway) -> anyhow::Result<Self> {
        Self::build(gateway, false)
    }

    fn build(gateway: RecordingGateway, fail_render: bool) -> anyhow::Result<Self> {
        Ok(Self {
            gateway: Arc::new(gateway),
            sessions: Arc::new(MemorySessionStore::default()),
            strings: Arc::new(test_strings()),
            jobs: Arc::new(Mutex::new(Vec::new())),
            fail_render,
            dir: tempfile::tempdir()?,
        })
    }

    pub fn controller(&self) -> Controller<RecordingGateway, MemorySessionStore, FakeRenderer> {
        let verses = VerseStore::from_chapters(
            [Chapter {
                id: 1,
                title: "Al-Fatiha".into(),
                title_ar: "الفاتحة".into(),
                verses: 7,
            }],
            Path::new("/nonexistent"),
        );
        let renderer = FakeRenderer {
            jobs: self.jobs.clone(),
            fail: self.fail_render,
        };
        Controller::new(
            self.gateway.clone(),
            self.sessions.clone(),
            Arc::new(verses),
            self.strings.clone(),
            RenderPool::new(renderer, 2),
            AuditLog::new(self.dir.path().join("log.txt")),
        )
    }

    pub fn renderer_jobs(&self) -> Vec<RenderJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn audit_lines(&self) -> anyhow::Result<Vec<String>> {
        let path = self.dir.path().join("log.txt");
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(std::fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect())
    }
}
