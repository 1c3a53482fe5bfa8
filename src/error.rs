use thiserror::Error;

/// Input the user can fix by answering the prompt again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown chapter")]
    UnknownChapter,

    #[error("verse number out of range")]
    InvalidVerse,

    #[error("verse range longer than {max} verses")]
    RangeTooLong { max: u32 },

    #[error("unknown reciter")]
    UnknownReciter,
}

#[derive(Debug, Error)]
pub enum VerseError {
    #[error("verse {verse} of chapter {chapter} not found: {reason}")]
    NotFound {
        chapter: u32,
        verse: u32,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no audio clips found for chapter {chapter} verses {start}-{end}")]
    NoAudio { chapter: u32, start: u32, end: u32 },

    #[error("invalid background color {0:?}")]
    InvalidColor(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}
