use lesson_core::model::Step;

/// Where a lesson stands, for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProgress {
    pub step: Step,
    pub step_index: usize,
    pub total_steps: usize,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub is_complete: bool,
}
