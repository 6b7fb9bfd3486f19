use std::sync::Arc;

use lesson_core::Clock;
use lesson_core::model::{ChapterId, LearnerId, LessonPolicy};
use lesson_core::unlock::ChapterOrder;
use storage::content::ContentSource;
use storage::repository::Storage;

use crate::catalog_service::CatalogService;
use crate::content_service::{ChapterCache, ContentService};
use crate::error::AppServicesError;
use crate::lessons::LessonLoopService;
use crate::progress_service::ProgressService;

/// Assembles app-facing services and resolves a usable learner id.
#[derive(Clone)]
pub struct AppServices {
    learner: LearnerId,
    new_learner: bool,
    cache: Arc<ChapterCache>,
    progress: Arc<ProgressService>,
    catalog: Arc<CatalogService>,
    lesson_loop: Arc<LessonLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization, chapter order
    /// resolution, or default learner setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        content: Arc<dyn ContentSource>,
        clock: Clock,
        policy: LessonPolicy,
        chapter_order: Option<Vec<ChapterId>>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, content, clock, policy, chapter_order).await
    }

    /// Build services over an already constructed `Storage`.
    ///
    /// Without an explicit `chapter_order`, chapters are ordered as the
    /// content source lists them.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the content listing, chapter order, or
    /// default learner setup fails.
    pub async fn from_storage(
        storage: Storage,
        content: Arc<dyn ContentSource>,
        clock: Clock,
        policy: LessonPolicy,
        chapter_order: Option<Vec<ChapterId>>,
    ) -> Result<Self, AppServicesError> {
        let cache = Arc::new(ChapterCache::new());
        let content = ContentService::new(content, Arc::clone(&cache));
        let progress = ProgressService::new(Arc::clone(&storage.progress));

        let order = match chapter_order {
            Some(chapters) => ChapterOrder::new(chapters)?,
            None => ChapterOrder::new(content.available_chapters().await?)?,
        };
        let (learner, new_learner) = ensure_default_learner(&progress).await?;
        tracing::info!(%learner, new_learner, chapters = order.chapters().len(), "app services ready");

        let catalog = Arc::new(CatalogService::new(
            content.clone(),
            progress.clone(),
            order,
        ));
        let lesson_loop = Arc::new(LessonLoopService::new(
            clock,
            policy,
            content,
            progress.clone(),
        ));

        Ok(Self {
            learner,
            new_learner,
            cache,
            progress: Arc::new(progress),
            catalog,
            lesson_loop,
        })
    }

    #[must_use]
    pub fn learner(&self) -> LearnerId {
        self.learner
    }

    /// Whether the learner was created during this start-up.
    #[must_use]
    pub fn is_new_learner(&self) -> bool {
        self.new_learner
    }

    #[must_use]
    pub fn chapter_cache(&self) -> Arc<ChapterCache> {
        Arc::clone(&self.cache)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn lesson_loop(&self) -> Arc<LessonLoopService> {
        Arc::clone(&self.lesson_loop)
    }
}

async fn ensure_default_learner(
    progress: &ProgressService,
) -> Result<(LearnerId, bool), AppServicesError> {
    if let Some(first) = progress.learners().await?.first() {
        return Ok((*first, false));
    }

    let learner = LearnerId::generate();
    progress.register(learner).await?;
    Ok((learner, true))
}
