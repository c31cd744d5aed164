use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use rand::{seq::SliceRandom, Rng};

use crate::catalog::Question;

/// Points awarded for every correct answer.
pub const CORRECT_ANSWER_AWARD: u32 = 10;

/// Quiz in progress in one chat.
#[derive(Debug, Clone)]
pub struct Session {
    category: String,
    questions: Vec<Question>,
    curr_idx: usize,
    score: u32,
}

impl Session {
    /// Starts a session over a shuffled copy of `questions`.
    pub fn new<R: Rng + ?Sized>(
        category: impl Into<String>,
        questions: &[Question],
        rng: &mut R,
    ) -> Self {
        let mut questions = questions.to_vec();
        questions.shuffle(rng);
        Self {
            category: category.into(),
            questions,
            curr_idx: 0,
            score: 0,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn curr_idx(&self) -> usize {
        self.curr_idx
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// `None` once every question has been answered.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.curr_idx)
    }

    pub fn is_completed(&self) -> bool {
        self.curr_idx >= self.questions.len()
    }

    pub(crate) fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_completed() {
            self.curr_idx += 1;
        }
    }
}

/// Slot holding the session of one chat, if any.
pub type SessionSlot = Arc<tokio::sync::Mutex<Option<Session>>>;

/// Per-chat session storage. Each chat gets its own lock, so a chat's
/// session is only ever touched by one operation at a time while other chats
/// proceed independently.
#[derive(Debug, Default)]
pub struct Sessions {
    by_chat: Mutex<HashMap<i64, SessionSlot>>,
}

impl Sessions {
    /// The slot of `chat_id`, created empty on first use.
    pub fn slot(&self, chat_id: i64) -> SessionSlot {
        // The map only ever gains entries, a panic can't leave it inconsistent.
        let mut by_chat = self.by_chat.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(by_chat.entry(chat_id).or_default())
    }
}
