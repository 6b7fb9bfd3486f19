use lesson_core::model::content::{ComprehensionDraft, Word, WordOrderPrompt};
use lesson_core::model::{Chapter, ChapterDraft, VerseDraft};

pub(crate) const WORDS: [&str; 4] = ["w0", "w1", "w2", "w3"];

pub(crate) fn verse_draft(number: u32) -> VerseDraft {
    VerseDraft {
        number,
        arabic_text: WORDS.join(" "),
        transliteration: String::new(),
        translation: format!("verse {number}"),
        explanation: "explained".to_owned(),
        audio_url: format!("audio/{number}.mp3"),
        words: (0_u32..)
            .zip(WORDS)
            .map(|(position, text)| Word {
                text: text.to_owned(),
                transliteration: String::new(),
                meaning: String::new(),
                position,
            })
            .collect(),
        word_order: WordOrderPrompt {
            instruction: "Order the words".to_owned(),
            hint: None,
        },
        comprehension: ComprehensionDraft {
            question: "What is it about?".to_owned(),
            options: vec!["right".to_owned(), "wrong".to_owned(), "other".to_owned()],
            correct_option: 0,
            explanation: String::new(),
            hint: None,
        },
    }
}

/// Chapter with `total` verses, of which the first `bodies` ship content.
pub(crate) fn partial_chapter(id: u32, total: u32, bodies: u32) -> Chapter {
    ChapterDraft {
        number: id,
        name_native: format!("native {id}"),
        name_localized: format!("Chapter {id}"),
        meaning: String::new(),
        total_verses: total,
        verses: (1..=bodies).map(verse_draft).collect(),
    }
    .validate()
    .expect("test chapter should be valid")
}

pub(crate) fn chapter(id: u32, total: u32) -> Chapter {
    partial_chapter(id, total, total)
}
