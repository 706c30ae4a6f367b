use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use super::domain::{SubmissionId, SubmitRequest};
use super::notify::AnswerNotifier;
use super::repository::SubmissionRepository;
use super::service::{QnaService, QnaServiceError};

/// Router exposing the Q&A endpoints. The marketing site and the admin
/// console are served from other origins, so CORS is open for all three
/// routes; preflights are answered by the layer with an empty 200.
pub fn qna_router<R, N>(service: Arc<QnaService<R, N>>) -> Router
where
    R: SubmissionRepository + 'static,
    N: AnswerNotifier + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/qna",
            get(list_handler::<R, N>).post(submit_handler::<R, N>),
        )
        .route("/api/qna/:id/answer", put(answer_handler::<R, N>))
        .layer(cors)
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct AnswerRequest {
    #[serde(default)]
    answer: String,
}

async fn submit_handler<R, N>(
    State(service): State<Arc<QnaService<R, N>>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response
where
    R: SubmissionRepository + 'static,
    N: AnswerNotifier + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_body_response(rejection),
    };
    match service.submit(request).await {
        Ok(submission) => (StatusCode::CREATED, Json(submission)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn list_handler<R, N>(State(service): State<Arc<QnaService<R, N>>>) -> Response
where
    R: SubmissionRepository + 'static,
    N: AnswerNotifier + 'static,
{
    match service.list().await {
        Ok(submissions) => (StatusCode::OK, Json(submissions)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn answer_handler<R, N>(
    State(service): State<Arc<QnaService<R, N>>>,
    Path(id): Path<String>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Response
where
    R: SubmissionRepository + 'static,
    N: AnswerNotifier + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_body_response(rejection),
    };
    let id = SubmissionId(id);
    match service.answer(&id, &request.answer).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.submission)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Bodies the extractor cannot decode (malformed JSON, wrong-typed fields)
/// are client errors like any failed validation, so they come back as the
/// same 400 per-field shape instead of the extractor's default rejection.
fn bad_body_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": [{ "field": "body", "message": rejection.body_text() }]
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn error_response(error: QnaServiceError) -> Response {
    match error {
        QnaServiceError::Validation(validation) => {
            let payload = json!({ "error": validation.fields });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        QnaServiceError::NotFound => {
            let payload = json!({ "error": "submission not found" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        QnaServiceError::Repository(storage) => {
            let payload = json!({ "error": storage.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
