use crate::audit::AuditLog;
use crate::config::{Reciter, Strings, fill_placeholder};
use crate::error::InputError;
use crate::gateway::{BotGateway, Incoming, InlineButton, Keyboard};
use crate::render::{RenderJob, RenderPool, VideoRenderer};
use crate::session::{ChatId, Session, SessionStore, WizardState};
use crate::verses::{VerseStore, parse_verse_range};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reciter buttons, two per row. Each button carries the reciter's folder.
pub fn reciter_keyboard(reciters: &[Reciter]) -> Keyboard {
    reciters
        .chunks(2)
        .map(|row| {
            row.iter()
                .map(|r| InlineButton {
                    text: r.name.clone(),
                    callback_data: r.folder.clone(),
                })
                .collect()
        })
        .collect()
}

/// `/start`, optionally addressed as `/start@botname` or followed by a payload.
fn is_start_command(text: &str) -> bool {
    text.strip_prefix("/start")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('@') || rest.starts_with(char::is_whitespace))
}

/// Drives one chat through chapter → verses → reciter → render.
pub struct Controller<G, S, R> {
    gateway: Arc<G>,
    sessions: Arc<S>,
    verses: Arc<VerseStore>,
    strings: Arc<Strings>,
    pool: RenderPool<R>,
    audit: AuditLog,
}

impl<G, S, R> Controller<G, S, R>
where
    G: BotGateway,
    S: SessionStore,
    R: VideoRenderer,
{
    pub fn new(
        gateway: Arc<G>,
        sessions: Arc<S>,
        verses: Arc<VerseStore>,
        strings: Arc<Strings>,
        pool: RenderPool<R>,
        audit: AuditLog,
    ) -> Self {
        Self {
            gateway,
            sessions,
            verses,
            strings,
            pool,
            audit,
        }
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    pub async fn handle(&self, incoming: Incoming) -> anyhow::Result<()> {
        match incoming {
            Incoming::Message { chat, text } => self.on_message(chat, text.trim()).await,
            Incoming::Callback { id, chat, data } => self.on_callback(&id, chat, &data).await,
        }
    }

    async fn on_message(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        if is_start_command(text) {
            let restarted = self.sessions.with_session(chat, |s| {
                if s.state == WizardState::Rendering {
                    return false;
                }
                *s = Session {
                    state: WizardState::AwaitingChapter,
                    ..Session::default()
                };
                true
            });
            let reply = if restarted {
                &self.strings.select_surah
            } else {
                &self.strings.busy
            };
            return self.gateway.send_message(chat, reply).await;
        }

        let session = self.sessions.snapshot(chat);
        debug!(chat, state = ?session.state, "message");
        match session.state {
            WizardState::Start | WizardState::AwaitingChapter => self.on_chapter(chat, text).await,
            WizardState::AwaitingVerseRange => self.on_verse_range(chat, &session, text).await,
            WizardState::AwaitingReciter => match self.strings.reciter_by_name(text) {
                Some(reciter) => self.start_render(chat, reciter, None).await,
                None => self.reject(chat, InputError::UnknownReciter).await,
            },
            WizardState::Rendering => self.gateway.send_message(chat, &self.strings.busy).await,
        }
    }

    async fn on_chapter(&self, chat: ChatId, text: &str) -> anyhow::Result<()> {
        let chapter = match self.verses.find_chapter(text) {
            Ok(chapter) => chapter,
            Err(e) => return self.reject(chat, e).await,
        };
        self.sessions.with_session(chat, |s| {
            s.chapter = Some(chapter.id);
            s.range = None;
            s.state = WizardState::AwaitingVerseRange;
        });
        let prompt = fill_placeholder(&self.strings.select_ayah, &chapter.title_ar);
        self.gateway.send_message(chat, &prompt).await
    }

    async fn on_verse_range(&self, chat: ChatId, session: &Session, text: &str) -> anyhow::Result<()> {
        let Some(chapter) = session.chapter.and_then(|id| self.verses.chapter(id)) else {
            self.sessions.with_session(chat, |s| {
                s.chapter = None;
                s.state = WizardState::AwaitingChapter;
            });
            return self.gateway.send_message(chat, &self.strings.select_surah).await;
        };
        let range = match parse_verse_range(text, chapter.verses) {
            Ok(range) => range,
            Err(e) => return self.reject(chat, e).await,
        };
        self.sessions.with_session(chat, |s| {
            s.range = Some(range);
            s.state = WizardState::AwaitingReciter;
        });
        self.send_reciter_menu(chat).await
    }

    async fn on_callback(&self, callback_id: &str, chat: ChatId, data: &str) -> anyhow::Result<()> {
        if self.sessions.snapshot(chat).state != WizardState::AwaitingReciter {
            debug!(chat, data, "ignoring stale callback");
            return self.gateway.answer_callback(callback_id).await;
        }
        match self.strings.reciter_by_folder(data) {
            Some(reciter) => self.start_render(chat, reciter, Some(callback_id)).await,
            None => {
                self.gateway.answer_callback(callback_id).await?;
                self.reject(chat, InputError::UnknownReciter).await
            }
        }
    }

    async fn reject(&self, chat: ChatId, err: InputError) -> anyhow::Result<()> {
        debug!(chat, "rejected input: {}", err);
        let reply = match err {
            InputError::UnknownChapter => &self.strings.error_surah,
            InputError::InvalidVerse => &self.strings.error_ayah,
            InputError::RangeTooLong { .. } => &self.strings.error_range,
            InputError::UnknownReciter => &self.strings.error_reciter,
        };
        self.gateway.send_message(chat, reply).await?;
        if err == InputError::UnknownReciter {
            self.send_reciter_menu(chat).await?;
        }
        Ok(())
    }

    async fn send_reciter_menu(&self, chat: ChatId) -> anyhow::Result<()> {
        let keyboard = reciter_keyboard(&self.strings.reciters);
        self.gateway
            .send_keyboard(chat, &self.strings.select_reciter, &keyboard)
            .await
    }

    async fn start_render(
        &self,
        chat: ChatId,
        reciter: &Reciter,
        callback_id: Option<&str>,
    ) -> anyhow::Result<()> {
        let job = self.sessions.with_session(chat, |s| {
            let (Some(chapter), Some(range)) = (s.chapter, s.range) else {
                return None;
            };
            if s.state != WizardState::AwaitingReciter {
                return None;
            }
            s.state = WizardState::Rendering;
            s.reciter = Some(reciter.folder.clone());
            Some(RenderJob {
                chapter,
                range,
                reciter_folder: reciter.folder.clone(),
            })
        });
        if let Some(id) = callback_id {
            self.gateway.answer_callback(id).await?;
        }
        let Some(job) = job else {
            return self.gateway.send_message(chat, &self.strings.busy).await;
        };

        let generating = fill_placeholder(&self.strings.generating, &reciter.name);
        self.gateway.send_message(chat, &generating).await?;

        let result = self.pool.submit(job.clone()).await;
        self.sessions.reset(chat);

        match result {
            Ok(video) => {
                info!(chat, "Sending {} byte video", video.len());
                self.gateway.send_video(chat, video).await?;
                if let Err(e) = self.audit.append(&job).await {
                    error!("Failed to append audit line: {:#}", e);
                }
                self.gateway
                    .send_message(chat, &self.strings.feedback_prompt)
                    .await
            }
            Err(e) => {
                error!(chat, "Render failed for {:?}: {:#}", job, e);
                self.gateway
                    .send_message(chat, &self.strings.render_failed)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, Sent};
    use crate::verses::VerseRange;

    const CHAT: ChatId = 42;

    fn msg(text: &str) -> Incoming {
        Incoming::Message {
            chat: CHAT,
            text: text.into(),
        }
    }

    fn callback(data: &str) -> Incoming {
        Incoming::Callback {
            id: "cb-1".into(),
            chat: CHAT,
            data: data.into(),
        }
    }

    #[test]
    fn keyboard_has_two_buttons_per_row() {
        let reciters: Vec<Reciter> = (0..3)
            .map(|i| Reciter {
                name: format!("name{i}"),
                folder: format!("folder{i}"),
            })
            .collect();
        let keyboard = reciter_keyboard(&reciters);
        assert_eq!(keyboard.len(), 2);
        assert_eq!(keyboard[0].len(), 2);
        assert_eq!(keyboard[1].len(), 1);
        assert_eq!(keyboard[1][0].text, "name2");
        assert_eq!(keyboard[1][0].callback_data, "folder2");
    }

    #[tokio::test]
    async fn full_wizard_renders_once_and_audits() -> anyhow::Result<()> {
        let h = Harness::new()?;
        let c = h.controller();

        c.handle(msg("/start")).await?;
        c.handle(msg("1")).await?;
        c.handle(msg("1-3")).await?;
        c.handle(callback("warsh_yassin")).await?;

        let sent = h.gateway.take();
        assert_eq!(
            sent,
            vec![
                Sent::Text(CHAT, "select_surah".into()),
                Sent::Text(CHAT, "ayah for الفاتحة".into()),
                Sent::Keyboard(CHAT, "select_reciter".into(), reciter_keyboard(&h.strings.reciters)),
                Sent::Answer("cb-1".into()),
                Sent::Text(CHAT, "generating with Yassin".into()),
                Sent::Video(CHAT, b"warsh_yassin".to_vec()),
                Sent::Text(CHAT, "feedback".into()),
            ]
        );
        assert_eq!(
            h.renderer_jobs(),
            vec![RenderJob {
                chapter: 1,
                range: VerseRange { start: 1, end: 3 },
                reciter_folder: "warsh_yassin".into(),
            }]
        );
        let audit = h.audit_lines()?;
        assert_eq!(audit.len(), 1);
        assert!(audit[0].ends_with("[1][1,3][warsh_yassin]"));
        assert_eq!(c.sessions().snapshot(CHAT), Session::default());
        Ok(())
    }

    #[tokio::test]
    async fn invalid_input_keeps_the_state() -> anyhow::Result<()> {
        let h = Harness::new()?;
        let c = h.controller();

        c.handle(msg("/start")).await?;
        c.handle(msg("Al-Nothing")).await?;
        assert_eq!(c.sessions().snapshot(CHAT).state, WizardState::AwaitingChapter);

        c.handle(msg("Al-Fatiha")).await?;
        c.handle(msg("1-6")).await?;
        c.handle(msg("6-8")).await?;
        c.handle(msg("x")).await?;
        assert_eq!(c.sessions().snapshot(CHAT).state, WizardState::AwaitingVerseRange);

        c.handle(msg("7")).await?;
        assert_eq!(c.sessions().snapshot(CHAT).range, Some(VerseRange::single(7)));

        let texts: Vec<Sent> = h.gateway.take();
        assert_eq!(
            texts[1..6].to_vec(),
            vec![
                Sent::Text(CHAT, "error_surah".into()),
                Sent::Text(CHAT, "ayah for الفاتحة".into()),
                Sent::Text(CHAT, "error_range".into()),
                Sent::Text(CHAT, "error_ayah".into()),
                Sent::Text(CHAT, "error_ayah".into()),
            ]
        );
        assert!(h.renderer_jobs().is_empty());
        Ok(())
    }

    #[test]
    fn start_command_must_be_whole() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start@quranreel_bot"));
        assert!(is_start_command("/start hello"));
        assert!(!is_start_command("/startfoo"));
        assert!(!is_start_command("start"));
    }

    #[tokio::test]
    async fn prefixed_start_is_a_chapter_answer() -> anyhow::Result<()> {
        let h = Harness::new()?;
        let c = h.controller();

        c.handle(msg("/start")).await?;
        c.handle(msg("1")).await?;
        c.handle(msg("/startfoo")).await?;

        let sent = h.gateway.take();
        assert_eq!(sent.last(), Some(&Sent::Text(CHAT, "error_ayah".into())));
        assert_eq!(c.sessions().snapshot(CHAT).state, WizardState::AwaitingVerseRange);
        assert_eq!(c.sessions().snapshot(CHAT).chapter, Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn arabic_digits_pass_both_prompts() -> anyhow::Result<()> {
        let h = Harness::new()?;
        let c = h.controller();

        c.handle(msg("/start")).await?;
        c.handle(msg("١")).await?;
        c.handle(msg("٢-٤")).await?;

        let session = c.sessions().snapshot(CHAT);
        assert_eq!(session.state, WizardState::AwaitingReciter);
        assert_eq!(session.chapter, Some(1));
        assert_eq!(session.range, Some(VerseRange { start: 2, end: 4 }));
        Ok(())
    }

    #[tokio::test]
    async fn typed_reciter_name_is_accepted() -> anyhow::Result<()> {
        let h = Harness::new()?;
        let c = h.controller();

        c.handle(msg("1")).await?;
        c.handle(msg("2")).await?;
        c.handle(msg("Somebody")).await?;
        assert_eq!(c.sessions().snapshot(CHAT).state, WizardState::AwaitingReciter);
        c.handle(msg("Husary")).await?;

        let sent = h.gateway.take();
        assert!(sent.contains(&Sent::Text(CHAT, "error_reciter".into())));
        assert_eq!(
            sent.iter().filter(|s| matches!(s, Sent::Keyboard(..))).count(),
            2
        );
        assert_eq!(h.renderer_jobs()[0].reciter_folder, "husary");
        assert_eq!(h.renderer_jobs()[0].range, VerseRange::single(2));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_callback_reshows_menu() -> anyhow::Result<()> {
        let h = Harness::new()?;
        let c = h.controller();

        c.handle(msg("1")).await?;
        c.handle(msg("1")).await?;
        h.gateway.take();
        c.handle(callback("nobody")).await?;

        let sent = h.gateway.take();
        assert_eq!(sent[0], Sent::Answer("cb-1".into()));
        assert_eq!(sent[1], Sent::Text(CHAT, "error_reciter".into()));
        assert!(matches!(sent[2], Sent::Keyboard(..)));
        assert!(h.renderer_jobs().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn stale_callback_is_only_answered() -> anyhow::Result<()> {
        let h = Harness::new()?;
        let c = h.controller();

        c.handle(callback("warsh_yassin")).await?;
        assert_eq!(h.gateway.take(), vec![Sent::Answer("cb-1".into())]);
        assert!(h.renderer_jobs().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn input_while_rendering_is_busy() -> anyhow::Result<()> {
        let h = Harness::new()?;
        let c = h.controller();
        c.sessions().with_session(CHAT, |s| s.state = WizardState::Rendering);

        c.handle(msg("/start")).await?;
        c.handle(msg("1")).await?;
        assert_eq!(
            h.gateway.take(),
            vec![Sent::Text(CHAT, "busy".into()), Sent::Text(CHAT, "busy".into())]
        );
        assert_eq!(c.sessions().snapshot(CHAT).state, WizardState::Rendering);
        Ok(())
    }

    #[tokio::test]
    async fn failed_render_returns_to_start() -> anyhow::Result<()> {
        let h = Harness::failing()?;
        let c = h.controller();

        c.handle(msg("1")).await?;
        c.handle(msg("1-2")).await?;
        c.handle(callback("husary")).await?;

        let sent = h.gateway.take();
        assert_eq!(sent.last(), Some(&Sent::Text(CHAT, "render_failed".into())));
        assert!(!sent.iter().any(|s| matches!(s, Sent::Video(..))));
        assert!(h.audit_lines()?.is_empty());
        assert_eq!(c.sessions().snapshot(CHAT).state, WizardState::Start);
        Ok(())
    }
}
