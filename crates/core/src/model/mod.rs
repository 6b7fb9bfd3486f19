pub mod content;
mod ids;
mod policy;
mod progress;
mod step;

pub use content::{Chapter, ChapterDraft, ContentError, Verse, VerseDraft};
pub use ids::{ChapterId, LearnerId, ParseIdError, VerseNumber};

pub use policy::{LessonPolicy, PolicyError, StarMerge};
pub use progress::{
    ChapterProgress, CompletionEntry, LearnerProgress, ProgressError, VerseCompletion,
};
pub use step::{Step, StepEvent};
