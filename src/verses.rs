use crate::config::load_json_or_default;
use crate::error::{InputError, VerseError};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{info, warn};

pub const MAX_SPAN: u32 = 5;

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)").expect("valid range regex"));
static SINGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)").expect("valid single regex"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chapter {
    #[serde(skip)]
    pub id: u32,
    pub title: String,
    #[serde(rename = "titleAr")]
    pub title_ar: String,
    pub verses: u32,
}

/// Inclusive verse range within one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseRange {
    pub start: u32,
    pub end: u32,
}

impl VerseRange {
    pub fn single(verse: u32) -> Self {
        Self {
            start: verse,
            end: verse,
        }
    }

    /// Validate `start..=end` against the chapter length and the span limit.
    pub fn new(start: u32, end: u32, verse_count: u32) -> Result<Self, InputError> {
        // Span is checked first so "1-9" reports the span, not the bounds.
        if end >= start && end - start >= MAX_SPAN {
            return Err(InputError::RangeTooLong { max: MAX_SPAN });
        }
        if start > end || start < 1 || end > verse_count {
            return Err(InputError::InvalidVerse);
        }
        Ok(Self { start, end })
    }

    pub fn verses(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// Parse a decimal number written with ASCII or Arabic-Indic digits.
fn parse_number(text: &str) -> Option<u32> {
    let ascii: String = text
        .chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            _ => c,
        })
        .collect();
    ascii.parse().ok()
}

/// Parse `N` or `N-M` typed by the user. Only the leading match counts.
pub fn parse_verse_range(input: &str, verse_count: u32) -> Result<VerseRange, InputError> {
    let input = input.trim();
    let number = |text: &str| parse_number(text).ok_or(InputError::InvalidVerse);
    if let Some(caps) = RANGE_RE.captures(input) {
        return VerseRange::new(number(&caps[1])?, number(&caps[2])?, verse_count);
    }
    if let Some(caps) = SINGLE_RE.captures(input) {
        let verse = number(&caps[1])?;
        return VerseRange::new(verse, verse, verse_count);
    }
    Err(InputError::InvalidVerse)
}

#[derive(Debug, Default, Deserialize)]
struct ChapterFile {
    #[serde(default)]
    verse: HashMap<String, String>,
}

/// Read-only access to the chapter index and the per-chapter verse files.
#[derive(Debug, Clone, Default)]
pub struct VerseStore {
    chapters: BTreeMap<u32, Chapter>,
    verses_dir: PathBuf,
}

impl VerseStore {
    /// Load the chapter index. A missing or malformed index yields an empty store.
    pub fn load(index_path: &Path, verses_dir: &Path) -> Self {
        let raw: HashMap<String, Chapter> = load_json_or_default(index_path);
        let mut chapters = BTreeMap::new();
        for (key, mut chapter) in raw {
            match key.trim().parse::<u32>() {
                Ok(id) => {
                    chapter.id = id;
                    chapters.insert(id, chapter);
                }
                Err(_) => warn!("Skipping chapter with non-numeric key {:?}", key),
            }
        }
        info!("Loaded {} chapters from {}", chapters.len(), index_path.display());
        Self::from_chapters(chapters.into_values(), verses_dir)
    }

    pub fn from_chapters(chapters: impl IntoIterator<Item = Chapter>, verses_dir: &Path) -> Self {
        Self {
            chapters: chapters.into_iter().map(|c| (c.id, c)).collect(),
            verses_dir: verses_dir.to_path_buf(),
        }
    }

    pub fn chapter(&self, id: u32) -> Option<&Chapter> {
        self.chapters.get(&id)
    }

    /// Resolve user input as a chapter number or an exact Latin/Arabic title.
    pub fn find_chapter(&self, input: &str) -> Result<&Chapter, InputError> {
        let input = input.trim();
        if let Some(id) = parse_number(input) {
            return self.chapter(id).ok_or(InputError::UnknownChapter);
        }
        self.chapters
            .values()
            .find(|c| c.title == input || c.title_ar == input)
            .ok_or(InputError::UnknownChapter)
    }

    pub fn get_verse(&self, chapter: u32, verse: u32) -> Result<String, VerseError> {
        let not_found = |reason: String| VerseError::NotFound {
            chapter,
            verse,
            reason,
        };
        let path = self.verses_dir.join(format!("surah_{}.json", chapter));
        let data = fs::read_to_string(&path).map_err(|e| not_found(format!("{}: {}", path.display(), e)))?;
        let mut file: ChapterFile =
            serde_json::from_str(&data).map_err(|e| not_found(format!("{}: {}", path.display(), e)))?;
        file.verse
            .remove(&format!("verse_{}", verse))
            .ok_or_else(|| not_found("missing verse key".into()))
    }

    /// Texts for every verse of the range, skipping the ones that cannot be read.
    pub fn verses(&self, chapter: u32, range: VerseRange) -> Vec<String> {
        range
            .verses()
            .filter_map(|v| match self.get_verse(chapter, v) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            })
            .collect()
    }
}
