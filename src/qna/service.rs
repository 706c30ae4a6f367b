use std::sync::Arc;

use tracing::{debug, warn};

use super::domain::{validate, Submission, SubmissionId, SubmitRequest, ValidationError};
use super::notify::AnswerNotifier;
use super::repository::{RepositoryError, SubmissionRepository};

/// Stateless orchestrator for the submission lifecycle: validate, persist,
/// then notify best-effort. Holds no state of its own; the repository owns
/// the durable records.
pub struct QnaService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<R, N> QnaService<R, N>
where
    R: SubmissionRepository + 'static,
    N: AnswerNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Validate and store a new visitor question.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Submission, QnaServiceError> {
        let submission = validate(request)?;
        let stored = self.repository.create(submission).await?;
        Ok(stored)
    }

    /// All submissions, newest first.
    pub async fn list(&self) -> Result<Vec<Submission>, QnaServiceError> {
        Ok(self.repository.list_all().await?)
    }

    /// Record an answer and notify the submitter.
    ///
    /// The submitter's name and email are captured from the pre-update record
    /// so the notification never depends on a re-fetch after the write.
    /// Re-answering an already answered submission is allowed and refreshes
    /// both the answer text and `answered_at`. The notification outcome is
    /// reported alongside the stored record but never changes it: once the
    /// store write succeeds the answer stands.
    pub async fn answer(
        &self,
        id: &SubmissionId,
        answer: &str,
    ) -> Result<AnswerOutcome, QnaServiceError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(QnaServiceError::Validation(ValidationError::single(
                "answer",
                "answer must not be empty",
            )));
        }

        let existing = self
            .repository
            .get(id)
            .await?
            .ok_or(QnaServiceError::NotFound)?;

        let updated = self
            .repository
            .answer(id, answer)
            .await?
            .ok_or(QnaServiceError::NotFound)?;

        let notification = if self.notifier.is_configured() {
            if self
                .notifier
                .notify_answer(&existing.name, &existing.email, answer)
                .await
            {
                NotificationStatus::Sent
            } else {
                warn!(id = %updated.id, "answer stored but notification failed");
                NotificationStatus::Failed
            }
        } else {
            debug!(id = %updated.id, "notifier unconfigured; skipping answer notification");
            NotificationStatus::Skipped
        };

        Ok(AnswerOutcome {
            submission: updated,
            notification,
        })
    }
}

/// Result of the answer operation: the stored record plus what happened to
/// the side effect. HTTP responses expose only the submission.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub submission: Submission,
    pub notification: NotificationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    Sent,
    Failed,
    Skipped,
}

/// Error raised by the workflow service.
#[derive(Debug, thiserror::Error)]
pub enum QnaServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("submission not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
