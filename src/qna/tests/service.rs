use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::common::*;
use crate::qna::domain::{SubmissionId, SubmitRequest};
use crate::qna::repository::{RepositoryError, SubmissionRepository};
use crate::qna::service::{NotificationStatus, QnaService, QnaServiceError};

#[tokio::test]
async fn submit_stores_a_pending_submission() {
    let before = Utc::now();
    let (service, _, _) = memory_service();

    let submission = service.submit(submit_request()).await.expect("submits");

    assert_eq!(submission.name, "Alice");
    assert_eq!(submission.email, "alice@example.com");
    assert_eq!(submission.question, "How durable is the bag?");
    assert!(!submission.is_answered);
    assert!(submission.answer.is_none());
    assert!(submission.answered_at.is_none());
    assert!(submission.created_at >= before);
    assert!(!submission.id.0.is_empty());
}

#[tokio::test]
async fn submit_propagates_validation_errors() {
    let (service, repository, _) = memory_service();

    let request = SubmitRequest {
        email: "not-an-email".to_string(),
        ..submit_request()
    };

    match service.submit(request).await {
        Err(QnaServiceError::Validation(error)) => {
            assert_eq!(error.fields[0].field, "email");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    assert!(
        repository.list_all().await.expect("list").is_empty(),
        "rejected input must not be stored"
    );
}

#[tokio::test]
async fn list_returns_submissions_newest_first() {
    let (service, _, _) = memory_service();

    let first = service.submit(named_request("Alice")).await.expect("submits");
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = service.submit(named_request("Bob")).await.expect("submits");
    tokio::time::sleep(Duration::from_millis(5)).await;
    let third = service.submit(named_request("Chloe")).await.expect("submits");

    let listed = service.list().await.expect("lists");
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].id, third.id);
    assert_eq!(listed[1].id, second.id);
    assert_eq!(listed[2].id, first.id);
}

#[tokio::test]
async fn answer_marks_the_submission_answered_and_notifies() {
    let (service, _, notifier) = memory_service();
    let submission = service.submit(submit_request()).await.expect("submits");

    let outcome = service
        .answer(&submission.id, "Yes, fully waterproof.")
        .await
        .expect("answers");

    assert_eq!(outcome.notification, NotificationStatus::Sent);
    let updated = outcome.submission;
    assert!(updated.is_answered);
    assert_eq!(updated.answer.as_deref(), Some("Yes, fully waterproof."));
    assert!(updated.answered_at.expect("answered_at") >= updated.created_at);

    let deliveries = notifier.deliveries();
    assert_eq!(
        deliveries,
        vec![(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "Yes, fully waterproof.".to_string()
        )]
    );

    let listed = service.list().await.expect("lists");
    assert!(listed[0].is_answered, "list must reflect the stored answer");
}

#[tokio::test]
async fn answer_rejects_blank_text() {
    let (service, _, notifier) = memory_service();
    let submission = service.submit(submit_request()).await.expect("submits");

    match service.answer(&submission.id, "   ").await {
        Err(QnaServiceError::Validation(error)) => {
            assert_eq!(error.fields[0].field, "answer");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(notifier.deliveries().is_empty());
}

#[tokio::test]
async fn answer_signals_not_found_and_leaves_the_store_untouched() {
    let (service, _, notifier) = memory_service();
    service.submit(submit_request()).await.expect("submits");
    let before = service.list().await.expect("lists");

    match service
        .answer(&SubmissionId("nonexistent-id".to_string()), "x")
        .await
    {
        Err(QnaServiceError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    let after = service.list().await.expect("lists");
    assert_eq!(before, after);
    assert!(notifier.deliveries().is_empty());
}

#[tokio::test]
async fn notification_failure_never_changes_the_answer_result() {
    let repository = Arc::new(crate::qna::memory::InMemorySubmissionRepository::default());
    let notifier = Arc::new(RecordingNotifier::failing());
    let service = QnaService::new(repository.clone(), notifier.clone());

    let submission = service.submit(submit_request()).await.expect("submits");
    let outcome = service
        .answer(&submission.id, "Shipping is free.")
        .await
        .expect("answer succeeds despite notification failure");

    assert_eq!(outcome.notification, NotificationStatus::Failed);
    assert!(outcome.submission.is_answered);

    let stored = repository
        .get(&submission.id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(stored.answer.as_deref(), Some("Shipping is free."));
    assert_eq!(notifier.deliveries().len(), 1);
}

#[tokio::test]
async fn unconfigured_notifier_is_skipped_entirely() {
    let repository = Arc::new(crate::qna::memory::InMemorySubmissionRepository::default());
    let notifier = Arc::new(RecordingNotifier::unconfigured());
    let service = QnaService::new(repository, notifier.clone());

    let submission = service.submit(submit_request()).await.expect("submits");
    let outcome = service
        .answer(&submission.id, "We ship worldwide.")
        .await
        .expect("answers");

    assert_eq!(outcome.notification, NotificationStatus::Skipped);
    assert!(outcome.submission.is_answered);
    assert!(
        notifier.deliveries().is_empty(),
        "unconfigured notifier must never be invoked"
    );
}

#[tokio::test]
async fn re_answering_updates_the_stored_answer() {
    let (service, _, notifier) = memory_service();
    let submission = service.submit(submit_request()).await.expect("submits");

    let first = service
        .answer(&submission.id, "Yes.")
        .await
        .expect("first answer");
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = service
        .answer(&submission.id, "Yes, and it is compostable.")
        .await
        .expect("re-answer");

    assert_eq!(
        second.submission.answer.as_deref(),
        Some("Yes, and it is compostable.")
    );
    assert!(
        second.submission.answered_at.expect("answered_at")
            > first.submission.answered_at.expect("answered_at")
    );
    assert_eq!(notifier.deliveries().len(), 2);
}

#[tokio::test]
async fn storage_failures_surface_distinctly_from_client_errors() {
    let repository = Arc::new(UnavailableRepository);
    let notifier = Arc::new(RecordingNotifier::configured());
    let service = QnaService::new(repository, notifier);

    match service.submit(submit_request()).await {
        Err(QnaServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected storage failure, got {other:?}"),
    }

    match service.list().await {
        Err(QnaServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected storage failure, got {other:?}"),
    }
}
