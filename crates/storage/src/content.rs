//! Content record adapters.
//!
//! Chapters arrive as JSON (`camelCase` keys) and are validated into
//! `lesson_core` types before anything else sees them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lesson_core::model::content::{ComprehensionDraft, Word, WordOrderPrompt};
use lesson_core::model::{Chapter, ChapterDraft, ChapterId, ContentError, VerseDraft};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentSourceError {
    #[error("chapter {0} not found")]
    NotFound(ChapterId),

    #[error("chapter {chapter} could not be parsed: {message}")]
    Parse { chapter: ChapterId, message: String },

    #[error("chapter {chapter} is invalid: {source}")]
    Invalid {
        chapter: ChapterId,
        #[source]
        source: ContentError,
    },

    #[error("content io error: {0}")]
    Io(String),
}

impl ContentSourceError {
    /// Whether trying the same load again may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, ContentSourceError::Io(_))
    }
}

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

/// Supplies validated chapter content records.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Load one chapter.
    ///
    /// # Errors
    ///
    /// Returns `ContentSourceError` if the chapter is missing or malformed.
    async fn load_chapter(&self, chapter: ChapterId) -> Result<Chapter, ContentSourceError>;

    /// Ids of every chapter this source can supply, ascending.
    ///
    /// # Errors
    ///
    /// Returns `ContentSourceError::Io` if the listing cannot be produced.
    async fn list_chapters(&self) -> Result<Vec<ChapterId>, ContentSourceError>;
}

//
// ─── WIRE RECORDS ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub text: String,
    #[serde(default)]
    pub transliteration: String,
    #[serde(default)]
    pub meaning: String,
    pub position: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordOrderRecord {
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensionRecord {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseRecord {
    pub verse_number: u32,
    pub arabic_text: String,
    #[serde(default)]
    pub transliteration: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub audio_url: String,
    pub words: Vec<WordRecord>,
    pub quiz1: WordOrderRecord,
    pub quiz2: ComprehensionRecord,
}

/// Persisted shape of a chapter content file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    pub number: u32,
    #[serde(default)]
    pub name_native: String,
    #[serde(default)]
    pub name_localized: String,
    #[serde(default)]
    pub meaning: String,
    pub total_verses: u32,
    #[serde(default)]
    pub verses: Vec<VerseRecord>,
}

impl VerseRecord {
    fn into_draft(self) -> VerseDraft {
        VerseDraft {
            number: self.verse_number,
            arabic_text: self.arabic_text,
            transliteration: self.transliteration,
            translation: self.translation,
            explanation: self.explanation,
            audio_url: self.audio_url,
            words: self
                .words
                .into_iter()
                .map(|w| Word {
                    text: w.text,
                    transliteration: w.transliteration,
                    meaning: w.meaning,
                    position: w.position,
                })
                .collect(),
            word_order: WordOrderPrompt {
                instruction: self.quiz1.instruction,
                hint: self.quiz1.hint,
            },
            comprehension: ComprehensionDraft {
                question: self.quiz2.question,
                options: self.quiz2.options,
                correct_option: self.quiz2.correct_option_index,
                explanation: self.quiz2.explanation,
                hint: self.quiz2.hint,
            },
        }
    }
}

impl ChapterRecord {
    /// Convert the record into a validated domain `Chapter`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the chapter or any verse fails validation.
    pub fn into_chapter(self) -> Result<Chapter, ContentError> {
        ChapterDraft {
            number: self.number,
            name_native: self.name_native,
            name_localized: self.name_localized,
            meaning: self.meaning,
            total_verses: self.total_verses,
            verses: self.verses.into_iter().map(VerseRecord::into_draft).collect(),
        }
        .validate()
    }
}

/// Parse and validate a chapter document.
///
/// # Errors
///
/// Returns `ContentSourceError::Parse` for bad JSON, `Invalid` for content
/// that parses but cannot be taught, and `NotFound` when the document holds
/// a different chapter than requested.
pub fn parse_chapter(chapter: ChapterId, json: &str) -> Result<Chapter, ContentSourceError> {
    let record: ChapterRecord =
        serde_json::from_str(json).map_err(|err| ContentSourceError::Parse {
            chapter,
            message: err.to_string(),
        })?;
    if record.number != chapter.value() {
        return Err(ContentSourceError::NotFound(chapter));
    }
    record
        .into_chapter()
        .map_err(|source| ContentSourceError::Invalid { chapter, source })
}

//
// ─── IN-MEMORY SOURCE ──────────────────────────────────────────────────────────
//

/// Content held in memory, for tests and embedded catalogs.
#[derive(Clone, Default)]
pub struct InMemoryContent {
    chapters: Arc<Mutex<BTreeMap<ChapterId, Chapter>>>,
}

impl InMemoryContent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_chapter(self, chapter: Chapter) -> Self {
        self.insert(chapter);
        self
    }

    pub fn insert(&self, chapter: Chapter) {
        self.chapters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chapter.id(), chapter);
    }
}

#[async_trait]
impl ContentSource for InMemoryContent {
    async fn load_chapter(&self, chapter: ChapterId) -> Result<Chapter, ContentSourceError> {
        let guard = self.chapters.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .get(&chapter)
            .cloned()
            .ok_or(ContentSourceError::NotFound(chapter))
    }

    async fn list_chapters(&self) -> Result<Vec<ChapterId>, ContentSourceError> {
        let guard = self.chapters.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.keys().copied().collect())
    }
}

//
// ─── JSON DIRECTORY SOURCE ─────────────────────────────────────────────────────
//

/// Reads `chapter_<number>.json` files from a directory.
#[derive(Debug, Clone)]
pub struct JsonDirContent {
    root: PathBuf,
}

impl JsonDirContent {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chapter_path(&self, chapter: ChapterId) -> PathBuf {
        self.root.join(format!("chapter_{chapter}.json"))
    }

    fn chapter_from_file_name(name: &str) -> Option<ChapterId> {
        name.strip_prefix("chapter_")?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }
}

#[async_trait]
impl ContentSource for JsonDirContent {
    async fn load_chapter(&self, chapter: ChapterId) -> Result<Chapter, ContentSourceError> {
        let path = self.chapter_path(chapter);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ContentSourceError::NotFound(chapter));
            }
            Err(err) => {
                return Err(ContentSourceError::Io(format!("{}: {err}", path.display())));
            }
        };
        tracing::debug!(%chapter, path = %path.display(), "loaded chapter content");
        parse_chapter(chapter, &json)
    }

    async fn list_chapters(&self) -> Result<Vec<ChapterId>, ContentSourceError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|err| ContentSourceError::Io(format!("{}: {err}", self.root.display())))?;
        let mut chapters = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| ContentSourceError::Io(err.to_string()))?
        {
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(Self::chapter_from_file_name)
            {
                chapters.push(id);
            }
        }
        chapters.sort_unstable();
        Ok(chapters)
    }
}
