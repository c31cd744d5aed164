use std::path::PathBuf;

use thiserror::Error;

/// Failure to build the category catalog. Always fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read category content at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed category file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("category '{category}' question #{index}: {reason}")]
    InvalidQuestion {
        category: String,
        index: usize,
        reason: &'static str,
    },

    #[error("category name '{0}' is too long for a button")]
    CategoryNameTooLong(String),

    #[error("category '{0}' has no questions")]
    EmptyCategory(String),

    #[error("no categories found in {0}")]
    EmptyCatalog(PathBuf),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Errors raised by quiz engine operations. All of them are recoverable and
/// end up as a text reply to the user.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("no active question in this chat")]
    InvalidSession,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuizError {
    pub fn user_message(&self) -> String {
        match self {
            QuizError::UnknownCategory(name) => {
                format!("Category '{name}' doesn't exist. Type /cat to see available categories.")
            }
            QuizError::InvalidSession => {
                "There is no active question. Type /cat to start a new quiz.".to_owned()
            }
            QuizError::Storage(_) => {
                "Sorry, I couldn't access the scoreboard right now. Please try again.".to_owned()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TELOXIDE_TOKEN is not set and token file {path} could not be read: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bot token is empty")]
    EmptyToken,

    #[error("{name} can't be parsed: {reason}")]
    Invalid { name: &'static str, reason: String },
}
