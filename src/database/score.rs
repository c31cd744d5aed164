use std::fmt;

use sqlx::FromRow;

/// Number of rows returned by the global leaderboard.
pub const GLOBAL_LEADERBOARD_SIZE: u32 = 10;

/// One persisted row: the score of a user in a chat.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ScoreRecord {
    user_id: i64,
    user_name: String,
    chat_id: i64,
    score: u32,
}

impl ScoreRecord {
    pub fn new(user_id: i64, user_name: impl Into<String>, chat_id: i64, score: u32) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            chat_id,
            score,
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn score(&self) -> u32 {
        self.score
    }
}

impl fmt::Display for ScoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - Score: {}", self.user_name, self.score)
    }
}
