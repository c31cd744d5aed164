use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::instrument;

use crate::{
    catalog::{Catalog, Question},
    database::{ScoreRecord, ScoreStore},
    error::QuizError,
    session::{Session, Sessions, CORRECT_ANSWER_AWARD},
};

/// The user acting on the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: i64,
    pub name: String,
}

impl Player {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Question(Question),
    /// The session has been cleared.
    Completed { final_score: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub verdict: Verdict,
    /// Running score after grading.
    pub score: u32,
    pub next: Next,
}

/// Drives the quiz of every chat: category selection, grading and completion.
pub struct QuizEngine<S> {
    catalog: Catalog,
    store: Arc<S>,
    sessions: Sessions,
}

impl<S: ScoreStore> QuizEngine<S> {
    pub fn new(catalog: Catalog, store: Arc<S>) -> Self {
        Self {
            catalog,
            store,
            sessions: Sessions::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of the chat's session, if one is active.
    pub async fn session(&self, chat_id: i64) -> Option<Session> {
        let slot = self.sessions.slot(chat_id);
        let session = slot.lock().await;
        (*session).clone()
    }

    /// Starts a fresh session for `category` and returns its first question.
    /// An active session in the chat is discarded.
    pub async fn select_category(
        &self,
        chat_id: i64,
        category: &str,
    ) -> Result<Question, QuizError> {
        let mut rng = StdRng::from_entropy();
        self.select_category_with(chat_id, category, &mut rng).await
    }

    #[instrument(level = "info", skip(self, rng))]
    pub async fn select_category_with<R: Rng + ?Sized>(
        &self,
        chat_id: i64,
        category: &str,
        rng: &mut R,
    ) -> Result<Question, QuizError> {
        let Some(questions) = self.catalog.get(category) else {
            tracing::warn!("Chat {} selected unknown category '{}'", chat_id, category);
            return Err(QuizError::UnknownCategory(category.to_owned()));
        };

        let session = Session::new(category, questions, rng);
        let first = session
            .current_question()
            .cloned()
            .ok_or(QuizError::InvalidSession)?;

        let slot = self.sessions.slot(chat_id);
        *slot.lock().await = Some(session);
        tracing::info!(
            "Chat {} started category '{}' with {} questions",
            chat_id,
            category,
            questions.len()
        );
        Ok(first)
    }

    /// The question the chat is currently expected to answer.
    pub async fn present_question(&self, chat_id: i64) -> Result<Question, QuizError> {
        let slot = self.sessions.slot(chat_id);
        let session = slot.lock().await;
        session
            .as_ref()
            .and_then(Session::current_question)
            .cloned()
            .ok_or(QuizError::InvalidSession)
    }

    /// Grades `selected` against the current question and moves the session forward.
    ///
    /// A correct answer adds the award to the player's persisted score in this chat and
    /// saves it before the session advances, so a storage failure leaves everything as it was.
    /// The chat's session stays locked until the answer is fully applied.
    #[instrument(level = "info", skip(self))]
    pub async fn submit_answer(
        &self,
        player: &Player,
        chat_id: i64,
        selected: &str,
    ) -> Result<AnswerOutcome, QuizError> {
        let slot = self.sessions.slot(chat_id);
        let mut guard = slot.lock().await;
        let session = guard.as_mut().ok_or(QuizError::InvalidSession)?;
        let curr_idx = session.curr_idx();
        let is_correct = session
            .current_question()
            .ok_or(QuizError::InvalidSession)?
            .is_correct(selected);

        let verdict = if is_correct {
            let score = self
                .store
                .get_score(player.id, chat_id)
                .await?
                .saturating_add(CORRECT_ANSWER_AWARD);
            self.store
                .upsert_score(player.id, &player.name, chat_id, score)
                .await?;
            session.set_score(score);
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        session.advance();
        let score = session.score();
        let next_question = session.current_question().cloned();

        tracing::info!(
            "Player {} answered question #{} in chat {}: {:?}, score {}",
            player.id,
            curr_idx + 1,
            chat_id,
            verdict,
            score
        );

        let next = match next_question {
            Some(question) => Next::Question(question),
            None => {
                *guard = None;
                tracing::info!("Chat {} completed the quiz with score {}", chat_id, score);
                Next::Completed { final_score: score }
            }
        };

        Ok(AnswerOutcome {
            verdict,
            score,
            next,
        })
    }

    /// Drops the chat's session. Returns whether one was active.
    pub async fn end(&self, chat_id: i64) -> bool {
        let slot = self.sessions.slot(chat_id);
        let ended = slot.lock().await.take().is_some();
        if ended {
            tracing::info!("Chat {} abandoned its quiz", chat_id);
        }
        ended
    }

    pub async fn score(&self, user_id: i64, chat_id: i64) -> Result<u32, QuizError> {
        Ok(self.store.get_score(user_id, chat_id).await?)
    }

    pub async fn chat_highscores(&self, chat_id: i64) -> Result<Vec<ScoreRecord>, QuizError> {
        Ok(self.store.list_chat_scores(chat_id).await?)
    }

    pub async fn global_leaderboard(&self) -> Result<Vec<ScoreRecord>, QuizError> {
        Ok(self.store.list_global_scores().await?)
    }
}
