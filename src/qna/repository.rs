use async_trait::async_trait;

use super::domain::{NewSubmission, Submission, SubmissionId};

/// Storage contract for submissions, independent of any backend.
///
/// All adapters must be observationally equivalent for the same sequence of
/// calls: ids unique, `list_all` ordered newest first, unknown ids reported as
/// `None` rather than errors. Concurrent `answer` calls on the same id are
/// last-write-wins; no conflict detection is attempted.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Assign a fresh id and creation timestamp, store the record, and return
    /// it in full.
    async fn create(&self, submission: NewSubmission) -> Result<Submission, RepositoryError>;

    /// All stored submissions, most recent first. An empty store yields an
    /// empty vec.
    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError>;

    /// Look up a single submission; `None` for an unknown id.
    async fn get(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError>;

    /// Record an answer, marking the submission answered and stamping
    /// `answered_at`. Returns the updated record, or `None` for an unknown id.
    async fn answer(
        &self,
        id: &SubmissionId,
        answer: &str,
    ) -> Result<Option<Submission>, RepositoryError>;
}

/// Storage failures. The workflow never retries; the failure surfaces to the
/// HTTP boundary as a server error distinct from any client mistake.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
