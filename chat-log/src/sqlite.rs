//! SQLite implementation of the audit trail (`sqlx`, runtime-checked queries).

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::{debug, info};

use crate::{ChatLogError, Interaction, InteractionLogger};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS chat_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL UNIQUE,
        document_url TEXT,
        document_length INTEGER,
        document_processed_at TEXT,
        questions_count INTEGER NOT NULL DEFAULT 0,
        last_activity_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_chat_sessions_last_activity ON chat_sessions(last_activity_at)",
    r#"
    CREATE TABLE IF NOT EXISTS chat_interactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL REFERENCES chat_sessions(session_id) ON DELETE CASCADE,
        question TEXT NOT NULL,
        response TEXT NOT NULL,
        response_time_ms INTEGER,
        status TEXT NOT NULL DEFAULT 'success',
        metadata TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_chat_interactions_session ON chat_interactions(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_chat_interactions_status ON chat_interactions(status)",
    "CREATE INDEX IF NOT EXISTS idx_chat_interactions_created ON chat_interactions(created_at)",
];

/// Session row as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub questions_count: i64,
    pub document_url: Option<String>,
    pub document_length: Option<i64>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

pub struct SqliteChatLog {
    pool: SqlitePool,
}

impl SqliteChatLog {
    /// Opens (creating if missing) the database at `url` and ensures the schema.
    ///
    /// `sqlite::memory:` is supported; it is pinned to a single connection so
    /// every query sees the same database.
    pub async fn connect(url: &str) -> Result<Self, ChatLogError> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let max = if url.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max)
            .connect_with(opts)
            .await?;

        let log = Self { pool };
        log.migrate().await?;
        info!(max_connections = max, "chat log database ready");
        Ok(log)
    }

    async fn migrate(&self) -> Result<(), ChatLogError> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn session_summary(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionSummary>, ChatLogError> {
        let row = sqlx::query(
            "SELECT questions_count, document_url, document_length, last_activity_at
             FROM chat_sessions WHERE session_id = ?1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SessionSummary {
            questions_count: r.get("questions_count"),
            document_url: r.get("document_url"),
            document_length: r.get("document_length"),
            last_activity_at: r.get("last_activity_at"),
        }))
    }

    /// `(status, response_time_ms)` of a session's interactions, oldest first.
    pub async fn interaction_statuses(
        &self,
        session_id: &str,
    ) -> Result<Vec<(String, Option<i64>)>, ChatLogError> {
        let rows = sqlx::query_as::<_, (String, Option<i64>)>(
            "SELECT status, response_time_ms FROM chat_interactions
             WHERE session_id = ?1 ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl InteractionLogger for SqliteChatLog {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn record(&self, it: Interaction) -> Result<(), ChatLogError> {
        let now = Utc::now();
        let metadata = serde_json::to_string(&it.metadata)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO chat_sessions (session_id, questions_count, last_activity_at, created_at, updated_at)
             VALUES (?1, 1, ?2, ?2, ?2)
             ON CONFLICT(session_id) DO UPDATE SET
                 questions_count = questions_count + 1,
                 last_activity_at = excluded.last_activity_at,
                 updated_at = excluded.updated_at",
        )
        .bind(&it.session_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(doc) = &it.document {
            sqlx::query(
                "UPDATE chat_sessions
                 SET document_url = ?1, document_length = ?2, document_processed_at = ?3
                 WHERE session_id = ?4",
            )
            .bind(&doc.url)
            .bind(i64::try_from(doc.length).unwrap_or(i64::MAX))
            .bind(doc.processed_at)
            .bind(&it.session_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO chat_interactions
                 (session_id, question, response, response_time_ms, status, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&it.session_id)
        .bind(&it.question)
        .bind(&it.response)
        .bind(i64::try_from(it.response_time_ms).unwrap_or(i64::MAX))
        .bind(it.status.as_str())
        .bind(metadata)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(session_id = %it.session_id, status = it.status.as_str(), "interaction logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentInfo, InteractionStatus};

    fn interaction(sid: &str, status: InteractionStatus, doc: Option<DocumentInfo>) -> Interaction {
        Interaction {
            session_id: sid.into(),
            question: "¿Cuándo inicia el ciclo?".into(),
            response: "En febrero.".into(),
            response_time_ms: 1234,
            status,
            document: doc,
            metadata: serde_json::json!({"context_loaded": true}),
        }
    }

    #[tokio::test]
    async fn counts_questions_and_keeps_document_info() {
        let log = SqliteChatLog::connect("sqlite::memory:").await.unwrap();
        let doc = DocumentInfo {
            url: "https://x/guia.pdf".into(),
            length: 4200,
            processed_at: Utc::now(),
        };

        log.record(interaction("s1", InteractionStatus::Success, Some(doc)))
            .await
            .unwrap();
        log.record(interaction("s1", InteractionStatus::Error, None))
            .await
            .unwrap();

        let summary = log.session_summary("s1").await.unwrap().unwrap();
        assert_eq!(summary.questions_count, 2);
        assert_eq!(summary.document_url.as_deref(), Some("https://x/guia.pdf"));
        assert_eq!(summary.document_length, Some(4200));
        assert!(summary.last_activity_at.is_some());

        let rows = log.interaction_statuses("s1").await.unwrap();
        assert_eq!(
            rows,
            vec![
                ("success".to_string(), Some(1234)),
                ("error".to_string(), Some(1234))
            ]
        );
    }

    #[tokio::test]
    async fn unknown_session_has_no_summary() {
        let log = SqliteChatLog::connect("sqlite::memory:").await.unwrap();
        assert!(log.session_summary("nope").await.unwrap().is_none());
    }
}
