use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::score::{ScoreRecord, GLOBAL_LEADERBOARD_SIZE};
use crate::error::StorageError;

pub struct Connection {
    pool: SqlitePool,
}

impl Connection {
    /// Opens (creating if missing) the SQLite database at `connection_string`.
    pub async fn connect(connection_string: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(connection_string)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// A private in-memory database. The single connection is never recycled,
    /// otherwise the data would vanish with it.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        tracing::debug!("Running database migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
pub trait RetrieveScore {
    /// Score of `user_id` in `chat_id`, 0 when the user never scored there.
    async fn get_score(&self, user_id: i64, chat_id: i64) -> Result<u32, StorageError>;

    /// Every record of the chat, best first.
    async fn list_chat_scores(&self, chat_id: i64) -> Result<Vec<ScoreRecord>, StorageError>;

    /// Top records across all chats, best first.
    async fn list_global_scores(&self) -> Result<Vec<ScoreRecord>, StorageError>;
}

#[async_trait]
pub trait UpsertScore {
    async fn upsert_score(
        &self,
        user_id: i64,
        user_name: &str,
        chat_id: i64,
        score: u32,
    ) -> Result<(), StorageError>;
}

pub trait ScoreStore: RetrieveScore + UpsertScore + Send + Sync {}

impl<T: RetrieveScore + UpsertScore + Send + Sync> ScoreStore for T {}

#[async_trait]
impl RetrieveScore for Connection {
    async fn get_score(&self, user_id: i64, chat_id: i64) -> Result<u32, StorageError> {
        let score: Option<u32> =
            sqlx::query_scalar("SELECT score FROM highscores WHERE user_id = ?1 AND chat_id = ?2")
                .bind(user_id)
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(score.unwrap_or_default())
    }

    async fn list_chat_scores(&self, chat_id: i64) -> Result<Vec<ScoreRecord>, StorageError> {
        tracing::debug!("Listing scores of chat {}", chat_id);
        let records = sqlx::query_as::<_, ScoreRecord>(
            "SELECT user_id, user_name, chat_id, score FROM highscores
             WHERE chat_id = ?1
             ORDER BY score DESC, rowid ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_global_scores(&self) -> Result<Vec<ScoreRecord>, StorageError> {
        tracing::debug!("Listing global scores");
        let records = sqlx::query_as::<_, ScoreRecord>(
            "SELECT user_id, user_name, chat_id, score FROM highscores
             ORDER BY score DESC, rowid ASC
             LIMIT ?1",
        )
        .bind(GLOBAL_LEADERBOARD_SIZE)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

#[async_trait]
impl UpsertScore for Connection {
    async fn upsert_score(
        &self,
        user_id: i64,
        user_name: &str,
        chat_id: i64,
        score: u32,
    ) -> Result<(), StorageError> {
        tracing::debug!(
            "Saving score {} for user {} in chat {}",
            score,
            user_id,
            chat_id
        );
        // Updating in place keeps the rowid, so ties stay in first-insertion order.
        sqlx::query(
            "INSERT INTO highscores (user_id, user_name, chat_id, score)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, chat_id) DO UPDATE SET
                 user_name = excluded.user_name,
                 score = excluded.score",
        )
        .bind(user_id)
        .bind(user_name)
        .bind(chat_id)
        .bind(score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connection() -> Connection {
        let connection = Connection::in_memory().await.unwrap();
        connection.run_migrations().await.unwrap();
        connection
    }

    #[tokio::test]
    async fn missing_score_is_zero() {
        let connection = connection().await;
        assert_eq!(connection.get_score(1, 100).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_record() {
        let connection = connection().await;
        connection.upsert_score(1, "Ann", 100, 10).await.unwrap();
        connection.upsert_score(1, "Ann Lee", 100, 30).await.unwrap();
        connection.upsert_score(1, "Ann Lee", 100, 30).await.unwrap();

        assert_eq!(connection.get_score(1, 100).await.unwrap(), 30);
        assert_eq!(
            connection.list_chat_scores(100).await.unwrap(),
            vec![ScoreRecord::new(1, "Ann Lee", 100, 30)]
        );
    }

    #[tokio::test]
    async fn scores_are_kept_per_chat() {
        let connection = connection().await;
        connection.upsert_score(1, "Ann", 100, 10).await.unwrap();
        connection.upsert_score(1, "Ann", 200, 50).await.unwrap();

        assert_eq!(connection.get_score(1, 100).await.unwrap(), 10);
        assert_eq!(connection.get_score(1, 200).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn chat_listing_is_ranked_with_stable_ties() {
        let connection = connection().await;
        connection.upsert_score(1, "Ann", 100, 20).await.unwrap();
        connection.upsert_score(2, "Bob", 100, 40).await.unwrap();
        connection.upsert_score(3, "Cid", 100, 20).await.unwrap();
        connection.upsert_score(4, "Dan", 999, 90).await.unwrap();
        // Re-saving Ann must not move her behind Cid.
        connection.upsert_score(1, "Ann", 100, 20).await.unwrap();

        let names: Vec<_> = connection
            .list_chat_scores(100)
            .await
            .unwrap()
            .iter()
            .map(|record| record.user_name().to_owned())
            .collect();
        assert_eq!(names, vec!["Bob", "Ann", "Cid"]);
    }

    #[tokio::test]
    async fn global_listing_is_capped_at_ten() {
        let connection = connection().await;
        for user in 0..15 {
            connection
                .upsert_score(user, &format!("user{user}"), user % 3, (user as u32) * 10)
                .await
                .unwrap();
        }

        let records = connection.list_global_scores().await.unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(records[0].score(), 140);
        assert!(records
            .windows(2)
            .all(|pair| pair[0].score() >= pair[1].score()));
    }
}
