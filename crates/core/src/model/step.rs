use serde::{Deserialize, Serialize};

/// One stage of a verse lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Explanation,
    Recitation,
    Recording,
    WordOrderQuiz,
    ComprehensionQuiz,
    Celebration,
}

/// Navigation requested by the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    Next,
    Back,
}

impl Step {
    pub const FIRST: Step = Step::Explanation;

    /// Every step in lesson order.
    pub const ALL: [Step; 6] = [
        Step::Explanation,
        Step::Recitation,
        Step::Recording,
        Step::WordOrderQuiz,
        Step::ComprehensionQuiz,
        Step::Celebration,
    ];

    /// Transition table. `None` means the event has no target from this step.
    ///
    /// Gating (whether the learner *may* move) is enforced by the session;
    /// this table only says where a move leads.
    #[must_use]
    pub fn transition(self, event: StepEvent) -> Option<Step> {
        match (self, event) {
            (Step::Explanation, StepEvent::Next) => Some(Step::Recitation),
            (Step::Recitation, StepEvent::Next) => Some(Step::Recording),
            (Step::Recording, StepEvent::Next) => Some(Step::WordOrderQuiz),
            (Step::WordOrderQuiz, StepEvent::Next) => Some(Step::ComprehensionQuiz),
            (Step::ComprehensionQuiz, StepEvent::Next) => Some(Step::Celebration),
            (Step::Celebration, StepEvent::Next) => None,

            (Step::Explanation, StepEvent::Back) => None,
            (Step::Recitation, StepEvent::Back) => Some(Step::Explanation),
            (Step::Recording, StepEvent::Back) => Some(Step::Recitation),
            (Step::WordOrderQuiz, StepEvent::Back) => Some(Step::Recording),
            (Step::ComprehensionQuiz, StepEvent::Back) => Some(Step::WordOrderQuiz),
            (Step::Celebration, StepEvent::Back) => Some(Step::ComprehensionQuiz),
        }
    }

    #[must_use]
    pub fn next(self) -> Option<Step> {
        self.transition(StepEvent::Next)
    }

    #[must_use]
    pub fn previous(self) -> Option<Step> {
        self.transition(StepEvent::Back)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Celebration)
    }

    /// Zero-based position, for progress indicators.
    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Step::Explanation => "explanation",
            Step::Recitation => "recitation",
            Step::Recording => "recording",
            Step::WordOrderQuiz => "word order",
            Step::ComprehensionQuiz => "comprehension",
            Step::Celebration => "celebration",
        }
    }
}
