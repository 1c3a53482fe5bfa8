use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Read a JSON file, falling back to `T::default()` when it is missing or malformed.
pub fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            error!("Error loading {}: {}", path.display(), e);
            return T::default();
        }
    };
    match serde_json::from_str(&data) {
        Ok(value) => {
            info!("Loaded {}", path.display());
            value
        }
        Err(e) => {
            error!("Malformed JSON in {}: {}", path.display(), e);
            T::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reciter {
    pub name: String,
    pub folder: String,
}

/// Prompt strings and the reciter list, read from `commands.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Strings {
    pub select_surah: String,
    pub select_ayah: String,
    pub select_reciter: String,
    pub error_surah: String,
    pub error_ayah: String,
    pub error_reciter: String,
    pub error_range: String,
    pub generating: String,
    pub feedback_prompt: String,
    pub busy: String,
    pub render_failed: String,
    pub reciters: Vec<Reciter>,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            select_surah: "Send a surah number or name.".into(),
            select_ayah: "Surah {placeholder}: send an ayah number or a range like 1-5.".into(),
            select_reciter: "Choose a reciter.".into(),
            error_surah: "Surah not found, try again.".into(),
            error_ayah: "Invalid ayah number, try again.".into(),
            error_reciter: "Unknown reciter.".into(),
            error_range: "A range can span at most 5 ayahs.".into(),
            generating: "Generating the video with {placeholder}...".into(),
            feedback_prompt: "Send /start to make another video.".into(),
            busy: "Your video is still being generated, please wait.".into(),
            render_failed: "Sorry, the video could not be generated.".into(),
            reciters: Vec::new(),
        }
    }
}

impl Strings {
    pub fn reciter_by_name(&self, name: &str) -> Option<&Reciter> {
        self.reciters.iter().find(|r| r.name == name)
    }

    pub fn reciter_by_folder(&self, folder: &str) -> Option<&Reciter> {
        self.reciters.iter().find(|r| r.folder == folder)
    }
}

pub fn fill_placeholder(template: &str, value: &str) -> String {
    template.replace("{placeholder}", value)
}

/// Video dimensions and font settings, read from `config.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub video_width: u32,
    pub video_height: u32,
    pub font_size: f32,
    pub font_name: Option<String>,
    pub background: String,
    pub encoder_threads: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            video_width: 720,
            video_height: 1280,
            font_size: 48.0,
            font_name: None,
            background: "#000000".into(),
            encoder_threads: 32,
        }
    }
}
