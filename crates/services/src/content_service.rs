use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use lesson_core::model::{Chapter, ChapterId, Verse, VerseNumber};
use storage::content::ContentSource;

use crate::error::ContentLoadError;

/// Memo of loaded chapters, owned by whoever builds the services.
#[derive(Debug, Default)]
pub struct ChapterCache {
    entries: Mutex<HashMap<ChapterId, Arc<Chapter>>>,
}

impl ChapterCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, chapter: ChapterId) -> Option<Arc<Chapter>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chapter)
            .cloned()
    }

    pub fn insert(&self, chapter: Arc<Chapter>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chapter.id(), chapter);
    }

    pub fn invalidate(&self, chapter: ChapterId) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chapter);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads chapter content through a `ContentSource`, memoizing successes.
///
/// Failed loads are never cached, so a retry goes back to the source.
#[derive(Clone)]
pub struct ContentService {
    source: Arc<dyn ContentSource>,
    cache: Arc<ChapterCache>,
}

impl ContentService {
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, cache: Arc<ChapterCache>) -> Self {
        Self { source, cache }
    }

    /// Fetch a chapter, from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `ContentLoadError::Source` if the source cannot supply it.
    pub async fn chapter(&self, chapter: ChapterId) -> Result<Arc<Chapter>, ContentLoadError> {
        if let Some(hit) = self.cache.get(chapter) {
            tracing::debug!(%chapter, "chapter cache hit");
            return Ok(hit);
        }

        let loaded = match self.source.load_chapter(chapter).await {
            Ok(loaded) => Arc::new(loaded),
            Err(err) => {
                tracing::warn!(%chapter, error = %err, "chapter content failed to load");
                return Err(err.into());
            }
        };
        self.cache.insert(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Fetch one verse together with its chapter.
    ///
    /// # Errors
    ///
    /// Returns `ContentLoadError::VerseMissing` if the chapter has no body
    /// for that verse, or any error from loading the chapter.
    pub async fn verse(
        &self,
        chapter: ChapterId,
        verse: VerseNumber,
    ) -> Result<(Arc<Chapter>, Verse), ContentLoadError> {
        let loaded = self.chapter(chapter).await?;
        let body = loaded
            .verse(verse)
            .cloned()
            .ok_or(ContentLoadError::VerseMissing { chapter, verse })?;
        Ok((loaded, body))
    }

    /// Chapters the source can supply, ascending.
    ///
    /// # Errors
    ///
    /// Returns `ContentLoadError::Source` if the listing fails.
    pub async fn available_chapters(&self) -> Result<Vec<ChapterId>, ContentLoadError> {
        Ok(self.source.list_chapters().await?)
    }

    #[must_use]
    pub fn cache(&self) -> &ChapterCache {
        &self.cache
    }
}
