use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::domain::{NewSubmission, Submission, SubmissionId};
use super::repository::{RepositoryError, SubmissionRepository};

/// Process-local store, the default backend and the test double. Contents are
/// lost on restart.
#[derive(Default, Clone)]
pub struct InMemorySubmissionRepository {
    records: Arc<Mutex<HashMap<SubmissionId, Submission>>>,
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn create(&self, submission: NewSubmission) -> Result<Submission, RepositoryError> {
        let record = Submission {
            id: SubmissionId(Uuid::new_v4().to_string()),
            name: submission.name,
            email: submission.email,
            question: submission.question,
            answer: None,
            is_answered: false,
            created_at: Utc::now(),
            answered_at: None,
        };

        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<Submission> = guard.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn get(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn answer(
        &self,
        id: &SubmissionId,
        answer: &str,
    ) -> Result<Option<Submission>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(id) {
            Some(record) => {
                record.answer = Some(answer.to_string());
                record.is_answered = true;
                record.answered_at = Some(Utc::now());
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }
}
