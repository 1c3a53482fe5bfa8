use crate::error::RenderError;
use fontdue::{Font, FontSettings};
use std::fs;
use std::path::Path;

/// Glyphs the render font cannot draw.
const UNSUPPORTED_GLYPHS: &[char] = &['\u{06ED}'];

/// Pixel measurements of rendered text.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f32;
    fn line_height(&self) -> f32;
}

/// Glyph advances from a TTF/OTF font at a fixed pixel size.
pub struct FontMetrics {
    font: Font,
    px: f32,
}

impl FontMetrics {
    pub fn load(path: &Path, px: f32) -> Result<Self, RenderError> {
        let bytes = fs::read(path)
            .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;
        Ok(Self { font, px })
    }
}

impl TextMeasure for FontMetrics {
    fn text_width(&self, text: &str) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, self.px).advance_width)
            .sum()
    }

    fn line_height(&self) -> f32 {
        self.font
            .horizontal_line_metrics(self.px)
            .map(|m| m.new_line_size)
            .unwrap_or(self.px * 1.2)
    }
}

pub fn strip_unsupported(text: &str) -> String {
    text.chars().filter(|c| !UNSUPPORTED_GLYPHS.contains(c)).collect()
}

/// Greedy word wrap. A word wider than `max_width` gets a line of its own.
pub fn wrap(text: &str, max_width: f32, measure: &impl TextMeasure) -> Vec<String> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    for word in words {
        let candidate = format!("{} {}", current, word);
        if measure.text_width(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Wrap each verse on its own and separate verses with an empty line.
pub fn wrap_verses(verses: &[String], max_width: f32, measure: &impl TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    for verse in verses {
        let wrapped = wrap(verse, max_width, measure);
        if wrapped.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(wrapped);
    }
    lines
}
