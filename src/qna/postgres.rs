use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::domain::{NewSubmission, Submission, SubmissionId};
use super::repository::{RepositoryError, SubmissionRepository};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS qna_submissions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT,
    is_answered BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    answered_at TIMESTAMPTZ
)
"#;

const COLUMNS: &str = "id, name, email, question, answer, is_answered, created_at, answered_at";

/// Relational adapter mapping submissions onto a `qna_submissions` table.
/// Every write is a single-row statement, so backend atomicity covers the
/// `create`/`answer` contract without explicit locking.
#[derive(Clone)]
pub struct PostgresSubmissionRepository {
    pool: PgPool,
}

impl PostgresSubmissionRepository {
    /// Connect and make sure the table exists.
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(unavailable)?;

        let repository = Self::with_pool(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

#[derive(FromRow)]
struct SubmissionRow {
    id: String,
    name: String,
    email: String,
    question: String,
    answer: Option<String>,
    is_answered: bool,
    created_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
}

impl From<SubmissionRow> for Submission {
    fn from(row: SubmissionRow) -> Self {
        Self {
            id: SubmissionId(row.id),
            name: row.name,
            email: row.email,
            question: row.question,
            answer: row.answer,
            is_answered: row.is_answered,
            created_at: row.created_at,
            answered_at: row.answered_at,
        }
    }
}

#[async_trait]
impl SubmissionRepository for PostgresSubmissionRepository {
    async fn create(&self, submission: NewSubmission) -> Result<Submission, RepositoryError> {
        let row: SubmissionRow = sqlx::query_as(&format!(
            "INSERT INTO qna_submissions (id, name, email, question, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.question)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.into())
    }

    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        let rows: Vec<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM qna_submissions ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let row: Option<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM qna_submissions WHERE id = $1"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.map(Into::into))
    }

    async fn answer(
        &self,
        id: &SubmissionId,
        answer: &str,
    ) -> Result<Option<Submission>, RepositoryError> {
        let row: Option<SubmissionRow> = sqlx::query_as(&format!(
            "UPDATE qna_submissions \
             SET answer = $2, is_answered = TRUE, answered_at = $3 \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(&id.0)
        .bind(answer)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.map(Into::into))
    }
}
