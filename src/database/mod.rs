pub mod connection;
pub mod score;

pub use connection::{Connection, RetrieveScore, ScoreStore, UpsertScore};
pub use score::ScoreRecord;
