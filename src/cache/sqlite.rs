use async_trait::async_trait;
use rusqlite::OptionalExtension;
use std::path::Path;
use tokio_rusqlite::Connection;

use super::ResponseCache;
use crate::error::GatewayResult;

const TABLE: &str = "chatbot_responses";

/// Question → response pairs in a single local SQLite file.
pub struct SqliteResponseCache {
    conn: Connection,
}

impl SqliteResponseCache {
    pub async fn open(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let conn = Connection::open(path.as_ref().to_path_buf()).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> GatewayResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> GatewayResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {TABLE} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    question TEXT NOT NULL UNIQUE,
                    response TEXT NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn len(&self) -> GatewayResult<usize> {
        let count = self
            .conn
            .call(|conn| {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
                Ok(n)
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl ResponseCache for SqliteResponseCache {
    async fn get(&self, question: &str) -> GatewayResult<Option<String>> {
        let question = question.to_string();
        let response = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        &format!("SELECT response FROM {TABLE} WHERE question = ?1"),
                        rusqlite::params![question],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;
        Ok(response)
    }

    async fn insert(&self, question: &str, response: &str) -> GatewayResult<bool> {
        let question = question.to_string();
        let response = response.to_string();
        let inserted = self
            .conn
            .call(move |conn| {
                // A concurrent miss on the same question may have stored it first.
                let n = conn.execute(
                    &format!("INSERT OR IGNORE INTO {TABLE} (question, response) VALUES (?1, ?2)"),
                    rusqlite::params![question, response],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_reads_back() {
        let cache = SqliteResponseCache::open_in_memory().await.unwrap();
        assert_eq!(cache.get("Q1").await.unwrap(), None);

        assert!(cache.insert("Q1", "A1").await.unwrap());
        assert_eq!(cache.get("Q1").await.unwrap().as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn lookup_is_exact() {
        let cache = SqliteResponseCache::open_in_memory().await.unwrap();
        cache.insert("Q1", "A1").await.unwrap();

        assert_eq!(cache.get("q1").await.unwrap(), None);
        assert_eq!(cache.get("Q1 ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_keeps_first_response() {
        let cache = SqliteResponseCache::open_in_memory().await.unwrap();
        assert!(cache.insert("Q1", "first").await.unwrap());
        assert!(!cache.insert("Q1", "second").await.unwrap());

        assert_eq!(cache.get("Q1").await.unwrap().as_deref(), Some("first"));
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.db");

        {
            let cache = SqliteResponseCache::open(&path).await.unwrap();
            cache.insert("Q1", "A1").await.unwrap();
        }

        let reopened = SqliteResponseCache::open(&path).await.unwrap();
        assert_eq!(reopened.get("Q1").await.unwrap().as_deref(), Some("A1"));
    }
}
