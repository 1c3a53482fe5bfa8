use crate::error::RenderError;
use crate::ffmpeg;
use crate::verses::VerseRange;
use hound::WavReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const FADE_IN_SECONDS: f64 = 0.5;
pub const FADE_OUT_SECONDS: f64 = 1.0;

pub fn wav_duration_seconds(path: &Path) -> Result<f64, RenderError> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = reader.len();
    let frames = samples as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;
    Ok(duration)
}

/// `{chapter:03}{verse:03}.mp3`
pub fn audio_filename(chapter: u32, verse: u32) -> String {
    format!("{:03}{:03}.mp3", chapter, verse)
}

/// Concatenated, faded recitation ready to be muxed.
#[derive(Debug, Clone)]
pub struct AssembledAudio {
    pub path: PathBuf,
    pub duration: f64,
}

pub struct AudioAssembler {
    reciter_dir: PathBuf,
}

impl AudioAssembler {
    pub fn new(reciters_dir: &Path, folder: &str) -> Self {
        Self {
            reciter_dir: reciters_dir.join(folder),
        }
    }

    /// Existing clip paths for the range, in verse order. Missing clips are logged and skipped.
    pub fn resolve_clips(&self, chapter: u32, range: VerseRange) -> Vec<PathBuf> {
        range
            .verses()
            .filter_map(|verse| {
                let path = self.reciter_dir.join(audio_filename(chapter, verse));
                if path.is_file() {
                    Some(path)
                } else {
                    warn!("Audio file not found: {}", path.display());
                    None
                }
            })
            .collect()
    }

    /// Concatenate the range's clips into `work_dir` and apply the fades.
    pub fn assemble(
        &self,
        chapter: u32,
        range: VerseRange,
        work_dir: &Path,
    ) -> Result<AssembledAudio, RenderError> {
        let clips = self.resolve_clips(chapter, range);
        if clips.is_empty() {
            return Err(RenderError::NoAudio {
                chapter,
                start: range.start,
                end: range.end,
            });
        }
        info!(
            "Concatenating {} clips for chapter {} verses {}-{}",
            clips.len(),
            chapter,
            range.start,
            range.end
        );

        let combined = work_dir.join("combined.wav");
        let mut args: Vec<String> = Vec::new();
        for clip in &clips {
            args.push("-i".into());
            args.push(clip.to_string_lossy().into_owned());
        }
        let inputs: String = (0..clips.len()).map(|i| format!("[{}:a]", i)).collect();
        args.extend([
            "-filter_complex".into(),
            format!("{}concat=n={}:v=0:a=1[out]", inputs, clips.len()),
            "-map".into(),
            "[out]".into(),
            "-c:a".into(),
            "pcm_s16le".into(),
            combined.to_string_lossy().into_owned(),
        ]);
        ffmpeg::run(&args)?;

        let duration = wav_duration_seconds(&combined)?;
        if duration <= 0.0 {
            return Err(RenderError::NoAudio {
                chapter,
                start: range.start,
                end: range.end,
            });
        }

        let faded = work_dir.join("audio.wav");
        let fade_out_start = (duration - FADE_OUT_SECONDS).max(0.0);
        ffmpeg::run([
            "-i".to_string(),
            combined.to_string_lossy().into_owned(),
            "-af".into(),
            format!(
                "afade=t=in:st=0:d={},afade=t=out:st={:.3}:d={}",
                FADE_IN_SECONDS, fade_out_start, FADE_OUT_SECONDS
            ),
            "-c:a".into(),
            "pcm_s16le".into(),
            faded.to_string_lossy().into_owned(),
        ])?;
        let duration = wav_duration_seconds(&faded)?;
        info!("Assembled audio {} ({:.2}s)", faded.display(), duration);

        Ok(AssembledAudio {
            path: faded,
            duration,
        })
    }
}
