use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::qna::domain::{NewSubmission, Submission, SubmissionId, SubmitRequest};
use crate::qna::memory::InMemorySubmissionRepository;
use crate::qna::notify::AnswerNotifier;
use crate::qna::repository::{RepositoryError, SubmissionRepository};
use crate::qna::router::qna_router;
use crate::qna::service::QnaService;

pub(super) fn submit_request() -> SubmitRequest {
    SubmitRequest {
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        question: "How durable is the bag?".to_string(),
    }
}

pub(super) fn named_request(name: &str) -> SubmitRequest {
    SubmitRequest {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase()),
        question: format!("{name} wants to know about recycled content."),
    }
}

pub(super) fn new_submission(name: &str) -> NewSubmission {
    NewSubmission {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase()),
        question: format!("{name} wants to know about recycled content."),
    }
}

/// Notifier double recording every delivery attempt.
#[derive(Default)]
pub(super) struct RecordingNotifier {
    configured: bool,
    fail: bool,
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub(super) fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            configured: true,
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn unconfigured() -> Self {
        Self::default()
    }

    pub(super) fn deliveries(&self) -> Vec<(String, String, String)> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl AnswerNotifier for RecordingNotifier {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn notify_answer(&self, name: &str, email: &str, answer: &str) -> bool {
        self.sent.lock().expect("notifier mutex poisoned").push((
            name.to_string(),
            email.to_string(),
            answer.to_string(),
        ));
        !self.fail
    }
}

/// Repository double for the storage-failure paths.
pub(super) struct UnavailableRepository;

#[async_trait]
impl SubmissionRepository for UnavailableRepository {
    async fn create(&self, _submission: NewSubmission) -> Result<Submission, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn get(&self, _id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn answer(
        &self,
        _id: &SubmissionId,
        _answer: &str,
    ) -> Result<Option<Submission>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn memory_service() -> (
    QnaService<InMemorySubmissionRepository, RecordingNotifier>,
    Arc<InMemorySubmissionRepository>,
    Arc<RecordingNotifier>,
) {
    let repository = Arc::new(InMemorySubmissionRepository::default());
    let notifier = Arc::new(RecordingNotifier::configured());
    let service = QnaService::new(repository.clone(), notifier.clone());
    (service, repository, notifier)
}

pub(super) fn memory_router() -> axum::Router {
    let (service, _, _) = memory_service();
    qna_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Drive the storage contract every adapter must satisfy against a live
/// repository: distinct ids, newest-first ordering, the answer transition,
/// and `None` (not an error) for unknown ids. Tolerates pre-existing rows so
/// it can also run against a shared database.
pub(super) async fn exercise_repository_contract<R: SubmissionRepository>(repository: &R) {
    let baseline = repository.list_all().await.expect("list").len();

    let alice = repository
        .create(new_submission("Alice"))
        .await
        .expect("create alice");
    assert!(!alice.is_answered);
    assert!(alice.answer.is_none());
    assert!(alice.answered_at.is_none());

    tokio::time::sleep(Duration::from_millis(5)).await;
    let bob = repository
        .create(new_submission("Bob"))
        .await
        .expect("create bob");
    tokio::time::sleep(Duration::from_millis(5)).await;
    let chloe = repository
        .create(new_submission("Chloe"))
        .await
        .expect("create chloe");

    assert_ne!(alice.id, bob.id);
    assert_ne!(bob.id, chloe.id);
    assert_ne!(alice.id, chloe.id);

    let listed = repository.list_all().await.expect("list");
    assert_eq!(listed.len(), baseline + 3);
    for pair in listed.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "list_all must be ordered newest first"
        );
    }
    let position = |id: &SubmissionId| {
        listed
            .iter()
            .position(|record| &record.id == id)
            .expect("created record listed")
    };
    assert!(position(&chloe.id) < position(&bob.id));
    assert!(position(&bob.id) < position(&alice.id));

    let fetched = repository.get(&alice.id).await.expect("get alice");
    assert_eq!(fetched.as_ref(), Some(&alice));
    let missing = repository
        .get(&SubmissionId("nonexistent-id".to_string()))
        .await
        .expect("get unknown id");
    assert!(missing.is_none());

    let answered = repository
        .answer(&chloe.id, "Yes, fully waterproof.")
        .await
        .expect("answer chloe")
        .expect("chloe exists");
    assert!(answered.is_answered);
    assert_eq!(answered.answer.as_deref(), Some("Yes, fully waterproof."));
    let answered_at = answered.answered_at.expect("answered_at set");
    assert!(answered_at >= answered.created_at);

    let relisted = repository.list_all().await.expect("list after answer");
    let stored = relisted
        .iter()
        .find(|record| record.id == chloe.id)
        .expect("chloe still listed");
    assert!(stored.is_answered, "list must reflect the update");

    let unknown = repository
        .answer(&SubmissionId("nonexistent-id".to_string()), "x")
        .await
        .expect("answer unknown id");
    assert!(unknown.is_none());
    assert_eq!(
        repository.list_all().await.expect("list").len(),
        baseline + 3,
        "unknown-id answer must not change the store"
    );

    // Re-answer is an allowed transition and refreshes the answer fields.
    let corrected = repository
        .answer(&chloe.id, "Correction: waterproof up to 30 minutes.")
        .await
        .expect("re-answer chloe")
        .expect("chloe exists");
    assert_eq!(
        corrected.answer.as_deref(),
        Some("Correction: waterproof up to 30 minutes.")
    );
    assert!(corrected.answered_at.expect("answered_at") >= answered_at);
}
