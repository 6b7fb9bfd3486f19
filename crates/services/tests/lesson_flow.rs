use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lesson_core::model::content::{ComprehensionDraft, Word, WordOrderPrompt};
use lesson_core::model::{
    Chapter, ChapterDraft, ChapterId, CompletionEntry, LearnerId, LearnerProgress, LessonPolicy,
    StarMerge, VerseDraft, VerseNumber,
};
use lesson_core::quiz::Placement;
use lesson_core::scoring::{PronunciationScore, Stars};
use lesson_core::time::fixed_now;
use lesson_core::unlock::ChapterOrder;
use services::{
    CatalogService, ChapterCache, Clock, ContentService, FixedScorer, LessonError,
    LessonLoopService, LessonSession, PersistenceError, ProgressService, PronunciationScorer,
    RecordingRef, Route, Transition,
};
use storage::content::{ContentSource, InMemoryContent};
use storage::repository::{InMemoryRepository, ProgressRepository, StorageError};

const FATIHA: ChapterId = ChapterId::new(1);

fn verse(number: u32, words: &[&str]) -> VerseDraft {
    VerseDraft {
        number,
        arabic_text: words.join(" "),
        transliteration: String::new(),
        translation: format!("Verse {number}"),
        explanation: format!("About verse {number}"),
        audio_url: format!("https://audio.example/1/{number}.mp3"),
        words: (1_u32..)
            .zip(words)
            .map(|(position, text)| Word {
                text: (*text).to_owned(),
                transliteration: String::new(),
                meaning: String::new(),
                position,
            })
            .collect(),
        word_order: WordOrderPrompt {
            instruction: "Arrange the words".to_owned(),
            hint: None,
        },
        comprehension: ComprehensionDraft {
            question: "What does this verse describe?".to_owned(),
            options: vec![
                "Praise".to_owned(),
                "A story".to_owned(),
                "A law".to_owned(),
            ],
            correct_option: 0,
            explanation: String::new(),
            hint: Some("Listen to the first word".to_owned()),
        },
    }
}

fn fatiha() -> Chapter {
    let words: [&[&str]; 7] = [
        &["بِسْمِ", "اللَّهِ", "الرَّحْمَٰنِ", "الرَّحِيمِ"],
        &["الْحَمْدُ", "لِلَّهِ", "رَبِّ", "الْعَالَمِينَ"],
        &["الرَّحْمَٰنِ", "الرَّحِيمِ"],
        &["مَالِكِ", "يَوْمِ", "الدِّينِ"],
        &["إِيَّاكَ", "نَعْبُدُ", "وَإِيَّاكَ", "نَسْتَعِينُ"],
        &["اهْدِنَا", "الصِّرَاطَ", "الْمُسْتَقِيمَ"],
        &["صِرَاطَ", "الَّذِينَ", "أَنْعَمْتَ", "عَلَيْهِمْ"],
    ];
    ChapterDraft {
        number: FATIHA.value(),
        name_native: "الفاتحة".to_owned(),
        name_localized: "Al-Fatiha".to_owned(),
        meaning: "The Opening".to_owned(),
        total_verses: 7,
        verses: (1_u32..).zip(words).map(|(n, w)| verse(n, w)).collect(),
    }
    .validate()
    .expect("valid chapter")
}

/// Wraps the in-memory store and fails saves while `failing` is set.
#[derive(Clone, Default)]
struct FlakyRepo {
    inner: InMemoryRepository,
    failing: Arc<AtomicBool>,
}

#[async_trait]
impl ProgressRepository for FlakyRepo {
    async fn load_progress(
        &self,
        learner: LearnerId,
    ) -> Result<Option<LearnerProgress>, StorageError> {
        self.inner.load_progress(learner).await
    }

    async fn save_progress(&self, progress: &LearnerProgress) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("disk full".into()));
        }
        self.inner.save_progress(progress).await
    }

    async fn list_learners(&self) -> Result<Vec<LearnerId>, StorageError> {
        self.inner.list_learners().await
    }
}

struct Harness {
    lessons: LessonLoopService,
    progress: ProgressService,
    catalog: CatalogService,
}

fn harness(repo: Arc<dyn ProgressRepository>, policy: LessonPolicy) -> Harness {
    let source: Arc<dyn ContentSource> = Arc::new(InMemoryContent::new().with_chapter(fatiha()));
    let content = ContentService::new(source, Arc::new(ChapterCache::new()));
    let progress = ProgressService::new(repo);
    let lessons = LessonLoopService::new(
        Clock::fixed(fixed_now()),
        policy,
        content.clone(),
        progress.clone(),
    );
    let catalog = CatalogService::new(
        content,
        progress.clone(),
        ChapterOrder::new([FATIHA]).expect("order"),
    );
    Harness {
        lessons,
        progress,
        catalog,
    }
}

fn solve_quizzes(session: &mut LessonSession) {
    let words = session.verse().canonical_words();
    assert!(session.submit_word_order(&words));
    assert!(session.submit_comprehension(0));
}

fn walk_to_celebration(session: &mut LessonSession) {
    while session.advance() != Transition::ReadyToComplete {}
}

#[tokio::test]
async fn perfect_first_verse_earns_three_stars() {
    let h = harness(Arc::new(InMemoryRepository::new()), LessonPolicy::default());
    let learner = LearnerId::generate();

    let mut session = h
        .lessons
        .open_session(learner, FATIHA, VerseNumber::FIRST)
        .await
        .unwrap();

    assert!(matches!(session.advance(), Transition::Moved { .. }));
    assert!(matches!(session.advance(), Transition::Moved { .. }));

    let take = RecordingRef::new("recordings/1-1.m4a");
    let scorer = FixedScorer::new(PronunciationScore::new(95).ok());
    let score = scorer.score(&take);
    session.submit_recording(take, score);
    session.advance();

    let words = session.verse().canonical_words();
    assert_eq!(session.submit_word(&words[1]), Placement::TryAgain);
    for (slot, word) in words.iter().enumerate() {
        assert_eq!(session.word_order().active_slot(), slot);
        assert!(matches!(
            session.submit_word(word),
            Placement::Accepted { .. }
        ));
    }
    session.advance();

    assert!(!session.submit_comprehension(2));
    assert!(session.submit_comprehension_text("Praise"));
    walk_to_celebration(&mut session);

    let outcome = h.lessons.complete_session(&mut session).await.unwrap();
    assert_eq!(outcome.stars, Stars::MAX);
    assert!(!outcome.chapter_now_complete);
    assert_eq!(outcome.route, Route::VerseList { chapter: FATIHA });

    let stored = h.progress.load(learner).await.unwrap();
    assert_eq!(
        stored.chapter(FATIHA).unwrap().stars_for(VerseNumber::FIRST),
        Some(Stars::MAX)
    );

    let verses = h.catalog.verse_list(learner, FATIHA).await.unwrap();
    assert!(verses[1].unlocked);
    assert!(!verses[2].unlocked);
}

#[tokio::test]
async fn seventh_verse_completes_the_chapter() {
    let h = harness(Arc::new(InMemoryRepository::new()), LessonPolicy::default());
    let learner = LearnerId::generate();

    for (verse, stars) in (1_u32..).zip([3_u8, 2, 3, 1, 2, 3]) {
        let progress = h
            .progress
            .record_completion(
                learner,
                &CompletionEntry {
                    chapter: FATIHA,
                    verse: VerseNumber::new(verse),
                    total_verses: 7,
                    stars: Stars::new(stars).unwrap(),
                    completed_at: fixed_now(),
                },
                StarMerge::Overwrite,
            )
            .await
            .unwrap();
        assert!(!progress.is_chapter_completed(FATIHA));
    }

    let mut session = h
        .lessons
        .open_session(learner, FATIHA, VerseNumber::new(7))
        .await
        .unwrap();
    solve_quizzes(&mut session);
    walk_to_celebration(&mut session);

    let outcome = h.lessons.complete_session(&mut session).await.unwrap();
    assert_eq!(outcome.stars.value(), 2);
    assert!(outcome.chapter_now_complete);
    assert_eq!(outcome.chapter_total_stars, Some(16));
    assert_eq!(
        outcome.route,
        Route::ChapterComplete {
            chapter: FATIHA,
            total_stars: 16
        }
    );

    let chapters = h.catalog.chapter_list(learner).await.unwrap();
    assert!(chapters[0].completed);
    assert_eq!(chapters[0].total_stars, 16);
}

#[tokio::test]
async fn required_recording_blocks_until_submitted() {
    let policy = LessonPolicy::default().with_recording_required(true);
    let h = harness(Arc::new(InMemoryRepository::new()), policy);

    let mut session = h
        .lessons
        .open_session(LearnerId::generate(), FATIHA, VerseNumber::FIRST)
        .await
        .unwrap();
    session.advance();
    session.advance();
    assert!(matches!(session.advance(), Transition::Blocked { .. }));

    session.submit_recording(RecordingRef::new("take.m4a"), None);
    assert!(matches!(session.advance(), Transition::Moved { .. }));
}

#[tokio::test]
async fn failed_save_keeps_stars_for_retry() {
    let repo = FlakyRepo::default();
    let h = harness(Arc::new(repo.clone()), LessonPolicy::default());
    let learner = LearnerId::generate();

    let mut session = h
        .lessons
        .open_session(learner, FATIHA, VerseNumber::FIRST)
        .await
        .unwrap();
    solve_quizzes(&mut session);
    walk_to_celebration(&mut session);

    repo.failing.store(true, Ordering::SeqCst);
    let err = h.lessons.complete_session(&mut session).await.unwrap_err();
    assert!(matches!(
        err,
        LessonError::Persistence(PersistenceError::Save(_))
    ));
    assert!(err.is_retryable());
    assert_eq!(session.stars().map(|s| s.value()), Some(2));
    assert!(!session.is_persisted());

    repo.failing.store(false, Ordering::SeqCst);
    let outcome = h.lessons.retry_completion(&mut session).await.unwrap();
    assert_eq!(outcome.stars.value(), 2);
    assert!(session.is_persisted());
    assert!(
        h.progress
            .load(learner)
            .await
            .unwrap()
            .is_verse_completed(FATIHA, VerseNumber::FIRST)
    );
}

async fn replay_first_verse(h: &Harness, learner: LearnerId, score: Option<u8>) -> Stars {
    let mut session = h
        .lessons
        .open_session(learner, FATIHA, VerseNumber::FIRST)
        .await
        .unwrap();
    let score = score.and_then(|v| PronunciationScore::new(v).ok());
    session.submit_recording(RecordingRef::new("take.m4a"), score);
    solve_quizzes(&mut session);
    walk_to_celebration(&mut session);
    h.lessons.complete_session(&mut session).await.unwrap().stars
}

#[tokio::test]
async fn weaker_replay_overwrites_stars_by_default() {
    let h = harness(Arc::new(InMemoryRepository::new()), LessonPolicy::default());
    let learner = LearnerId::generate();

    assert_eq!(replay_first_verse(&h, learner, Some(98)).await.value(), 3);
    assert_eq!(replay_first_verse(&h, learner, None).await.value(), 2);

    let stored = h.progress.load(learner).await.unwrap();
    let chapter = stored.chapter(FATIHA).unwrap();
    assert_eq!(chapter.completed_count(), 1);
    assert_eq!(chapter.stars_for(VerseNumber::FIRST).map(|s| s.value()), Some(2));
}

#[tokio::test]
async fn keep_best_policy_retains_higher_stars() {
    let policy = LessonPolicy::default().with_star_merge(StarMerge::KeepBest);
    let h = harness(Arc::new(InMemoryRepository::new()), policy);
    let learner = LearnerId::generate();

    replay_first_verse(&h, learner, Some(98)).await;
    replay_first_verse(&h, learner, None).await;

    let stored = h.progress.load(learner).await.unwrap();
    assert_eq!(stored.chapter_total_stars(FATIHA), 3);
}
