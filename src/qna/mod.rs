//! Q&A submission workflow: validation, the storage port and its adapters,
//! best-effort answer notification, and the HTTP routes tying them together.

pub mod domain;
pub mod hosted;
pub mod memory;
pub mod notify;
pub mod postgres;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    validate, FieldError, NewSubmission, Submission, SubmissionId, SubmitRequest, ValidationError,
};
pub use hosted::HostedTableRepository;
pub use memory::InMemorySubmissionRepository;
pub use notify::{AnswerNotifier, EmailNotifier};
pub use postgres::PostgresSubmissionRepository;
pub use repository::{RepositoryError, SubmissionRepository};
pub use router::qna_router;
pub use service::{AnswerOutcome, NotificationStatus, QnaService, QnaServiceError};
