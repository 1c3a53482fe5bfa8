use crate::audio::AssembledAudio;
use crate::error::RenderError;
use crate::ffmpeg::{self, escape_filter_path};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FPS: u32 = 25;
pub const AUDIO_BITRATE: &str = "64k";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    /// Parse `#RRGGBB` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, RenderError> {
        let invalid = || RenderError::InvalidColor(hex.to_string());
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Weighted luminance in `[0, 1]`.
    pub fn luminance(&self) -> f64 {
        let n = |c: u8| c as f64 / 255.0;
        0.299 * n(self.r) + 0.587 * n(self.g) + 0.114 * n(self.b)
    }

    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Black text above luminance 0.5, white text at or below it.
pub fn text_color(background: Rgb) -> Rgb {
    if background.luminance() > 0.5 {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    }
}

/// Text layer fade-in and fade-out lengths for a clip of `duration` seconds.
pub fn fade_durations(duration: f64) -> (f64, f64) {
    let third = duration / 3.0;
    ((third - 1.0).max(0.0), third)
}

/// Everything the filter graph needs to draw the scrolling text block.
#[derive(Debug, Clone)]
pub struct ScrollLayer {
    pub line_files: Vec<Option<PathBuf>>,
    pub font_path: PathBuf,
    pub font_size: f32,
    pub line_height: f32,
    pub color: Rgb,
    pub duration: f64,
}

impl ScrollLayer {
    pub fn block_height(&self) -> f32 {
        self.line_files.len() as f32 * self.line_height
    }

    fn alpha_expr(&self) -> String {
        let (fade_in, fade_out) = fade_durations(self.duration);
        let d = self.duration;
        let tail = if fade_out > 0.0 {
            format!(
                "if(gt(t,{:.3}),max(0,({:.3}-t)/{:.3}),1)",
                d - fade_out,
                d,
                fade_out
            )
        } else {
            "1".to_string()
        };
        if fade_in > 0.0 {
            format!("if(lt(t,{:.3}),t/{:.3},{})", fade_in, fade_in, tail)
        } else {
            tail
        }
    }

    /// Chain of `drawtext` filters from `[0:v]` to `[v]`, one per non-empty line.
    pub fn filter_graph(&self) -> String {
        let mut filters = Vec::new();
        let alpha = self.alpha_expr();
        let block = self.block_height();
        for (i, file) in self.line_files.iter().enumerate() {
            let Some(file) = file else { continue };
            let mut f = String::new();
            let _ = write!(
                f,
                "drawtext=fontfile={}:textfile={}:expansion=none:fontsize={}:fontcolor={}",
                escape_filter_path(&self.font_path),
                escape_filter_path(file),
                self.font_size,
                self.color.to_ffmpeg()
            );
            let _ = write!(
                f,
                ":x=(w-text_w)/2:y='h-t*(h+{:.3})/{:.3}+{:.3}':alpha='{}'",
                block,
                self.duration,
                i as f32 * self.line_height,
                alpha
            );
            filters.push(f);
        }
        if filters.is_empty() {
            return "[0:v]null[v]".to_string();
        }
        format!("[0:v]{}[v]", filters.join(","))
    }
}

pub struct VideoComposer {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub font_path: PathBuf,
    pub font_size: f32,
    pub threads: u32,
}

impl VideoComposer {
    /// Encode `lines` scrolling over the background for the length of `audio`.
    ///
    /// Intermediate files are written to `work_dir`; the caller owns its cleanup.
    pub fn compose(
        &self,
        lines: &[String],
        line_height: f32,
        audio: &AssembledAudio,
        work_dir: &Path,
    ) -> Result<Vec<u8>, RenderError> {
        let duration = audio.duration;
        let mut line_files = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                line_files.push(None);
                continue;
            }
            let path = work_dir.join(format!("line_{:03}.txt", i));
            fs::write(&path, line)?;
            line_files.push(Some(path));
        }

        let layer = ScrollLayer {
            line_files,
            font_path: self.font_path.clone(),
            font_size: self.font_size,
            line_height,
            color: text_color(self.background),
            duration,
        };
        let out = work_dir.join("video.mp4");
        info!(
            "Encoding {}x{} video, {} lines, {:.2}s",
            self.width,
            self.height,
            lines.len(),
            duration
        );

        ffmpeg::run([
            "-f".to_string(),
            "lavfi".into(),
            "-i".into(),
            format!(
                "color=c={}:s={}x{}:r={}:d={:.3}",
                self.background.to_ffmpeg(),
                self.width,
                self.height,
                FPS,
                duration
            ),
            "-i".into(),
            audio.path.to_string_lossy().into_owned(),
            "-filter_complex".into(),
            layer.filter_graph(),
            "-map".into(),
            "[v]".into(),
            "-map".into(),
            "1:a:0".into(),
            "-c:v".into(),
            "libx264".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-r".into(),
            FPS.to_string(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            AUDIO_BITRATE.into(),
            "-threads".into(),
            self.threads.to_string(),
            "-t".into(),
            format!("{:.3}", duration),
            "-movflags".into(),
            "+faststart".into(),
            out.to_string_lossy().into_owned(),
        ])?;

        let bytes = fs::read(&out)?;
        info!("Encoded {} bytes", bytes.len());
        Ok(bytes)
    }
}
