use crate::audio::AudioAssembler;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::verses::{VerseRange, VerseStore};
use crate::video::{Rgb, VideoComposer};
use crate::wrap::{FontMetrics, TextMeasure, strip_unsupported, wrap_verses};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// One video to produce. Consumed by a single render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub chapter: u32,
    pub range: VerseRange,
    pub reciter_folder: String,
}

/// Blocking job → mp4 bytes.
pub trait VideoRenderer: Send + Sync + 'static {
    fn render(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError>;
}

/// Filesystem layout of the render assets.
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub fonts_dir: PathBuf,
    pub reciters_dir: PathBuf,
}

/// Verse text + recitation → scrolling-text video through ffmpeg.
pub struct PipelineRenderer {
    verses: Arc<VerseStore>,
    config: RenderConfig,
    assets: AssetPaths,
}

impl PipelineRenderer {
    pub fn new(verses: Arc<VerseStore>, config: RenderConfig, assets: AssetPaths) -> Self {
        Self {
            verses,
            config,
            assets,
        }
    }

    fn font_path(&self) -> Result<PathBuf, RenderError> {
        let name = self
            .config
            .font_name
            .as_deref()
            .ok_or_else(|| RenderError::Font("no font_name configured".into()))?;
        Ok(self.assets.fonts_dir.join(name))
    }
}

impl VideoRenderer for PipelineRenderer {
    fn render(&self, job: &RenderJob) -> Result<Vec<u8>, RenderError> {
        info!(
            "Rendering chapter {} verses {}-{} with {}",
            job.chapter, job.range.start, job.range.end, job.reciter_folder
        );
        let background = Rgb::from_hex(&self.config.background)?;
        let font_path = self.font_path()?;
        let metrics = FontMetrics::load(&font_path, self.config.font_size)?;

        let texts: Vec<String> = self
            .verses
            .verses(job.chapter, job.range)
            .iter()
            .map(|t| strip_unsupported(t))
            .collect();
        if texts.is_empty() {
            warn!("No verse text for chapter {}; rendering without text", job.chapter);
        }
        let lines = wrap_verses(&texts, self.config.video_width as f32, &metrics);

        // Dropped with the render, taking every intermediate file with it.
        let work_dir = tempfile::Builder::new().prefix("quranreel-").tempdir()?;

        let audio = AudioAssembler::new(&self.assets.reciters_dir, &job.reciter_folder)
            .assemble(job.chapter, job.range, work_dir.path())?;

        let composer = VideoComposer {
            width: self.config.video_width,
            height: self.config.video_height,
            background,
            font_path,
            font_size: self.config.font_size,
            threads: self.config.encoder_threads,
        };
        composer.compose(&lines, metrics.line_height(), &audio, work_dir.path())
    }
}

/// Bounded set of blocking render workers.
pub struct RenderPool<R> {
    renderer: Arc<R>,
    permits: Arc<Semaphore>,
}

impl<R> Clone for RenderPool<R> {
    fn clone(&self) -> Self {
        Self {
            renderer: self.renderer.clone(),
            permits: self.permits.clone(),
        }
    }
}

impl<R: VideoRenderer> RenderPool<R> {
    pub fn new(renderer: R, workers: usize) -> Self {
        Self {
            renderer: Arc::new(renderer),
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Run `job` on a blocking worker once a slot frees up.
    pub async fn submit(&self, job: RenderJob) -> anyhow::Result<Vec<u8>> {
        let _permit = self.permits.clone().acquire_owned().await?;
        let renderer = self.renderer.clone();
        let bytes = tokio::task::spawn_blocking(move || renderer.render(&job)).await??;
        Ok(bytes)
    }
}
