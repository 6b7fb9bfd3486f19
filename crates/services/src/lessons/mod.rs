mod progress;
mod router;
mod session;
mod workflow;

// Public API of the lesson subsystem.
pub use crate::error::LessonError;
pub use progress::LessonProgress;
pub use router::{CompletionRouter, Route};
pub use session::{LessonResult, LessonSession, Recording, RecordingRef, Transition};
pub use workflow::{CompletionOutcome, LessonLoopService};
