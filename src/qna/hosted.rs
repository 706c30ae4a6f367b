use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{NewSubmission, Submission, SubmissionId};
use super::repository::{RepositoryError, SubmissionRepository};

const TABLE: &str = "qna_submissions";

/// Adapter for a hosted PostgREST-style table service.
///
/// The remote rows use the service's snake_case column naming (`is_answered`,
/// `answered_at`); `WireSubmission` and its conversions keep that naming
/// confined to this module. Ids and timestamps are generated client-side so
/// the adapter behaves identically to the other backends. Any transport or
/// decode failure maps to `RepositoryError::Unavailable`; an empty result set
/// on a keyed lookup is simply `None`.
pub struct HostedTableRepository {
    client: reqwest::Client,
    table_url: String,
}

impl HostedTableRepository {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, RepositoryError> {
        let mut headers = HeaderMap::new();

        let mut key = HeaderValue::from_str(api_key)
            .map_err(|err| RepositoryError::Unavailable(format!("invalid api key: {err}")))?;
        key.set_sensitive(true);
        headers.insert("apikey", key);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|err| RepositoryError::Unavailable(format!("invalid api key: {err}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| RepositoryError::Unavailable(format!("http client: {err}")))?;

        Ok(Self {
            client,
            table_url: format!("{}/rest/v1/{TABLE}", base_url.trim_end_matches('/')),
        })
    }
}

/// Row shape as stored by the hosted service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireSubmission {
    id: String,
    name: String,
    email: String,
    question: String,
    answer: Option<String>,
    is_answered: bool,
    created_at: DateTime<Utc>,
    answered_at: Option<DateTime<Utc>>,
}

impl WireSubmission {
    fn from_new(submission: NewSubmission) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: submission.name,
            email: submission.email,
            question: submission.question,
            answer: None,
            is_answered: false,
            created_at: Utc::now(),
            answered_at: None,
        }
    }

    fn into_submission(self) -> Submission {
        Submission {
            id: SubmissionId(self.id),
            name: self.name,
            email: self.email,
            question: self.question,
            answer: self.answer,
            is_answered: self.is_answered,
            created_at: self.created_at,
            answered_at: self.answered_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnswerPatch<'a> {
    answer: &'a str,
    is_answered: bool,
    answered_at: DateTime<Utc>,
}

fn unreachable_error(err: reqwest::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("hosted table service unreachable: {err}"))
}

async fn read_rows(response: reqwest::Response) -> Result<Vec<WireSubmission>, RepositoryError> {
    let status = response.status();
    if !status.is_success() {
        return Err(RepositoryError::Unavailable(format!(
            "hosted table service responded with {status}"
        )));
    }

    response
        .json::<Vec<WireSubmission>>()
        .await
        .map_err(|err| RepositoryError::Unavailable(format!("hosted table service payload: {err}")))
}

#[async_trait]
impl SubmissionRepository for HostedTableRepository {
    async fn create(&self, submission: NewSubmission) -> Result<Submission, RepositoryError> {
        let record = WireSubmission::from_new(submission);

        let response = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(unreachable_error)?;

        let rows = read_rows(response).await?;
        rows.into_iter()
            .next()
            .map(WireSubmission::into_submission)
            .ok_or_else(|| {
                RepositoryError::Unavailable("hosted table service returned no rows".to_string())
            })
    }

    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        let response = self
            .client
            .get(&self.table_url)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(unreachable_error)?;

        let rows = read_rows(response).await?;
        Ok(rows
            .into_iter()
            .map(WireSubmission::into_submission)
            .collect())
    }

    async fn get(&self, id: &SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let filter = format!("eq.{id}");
        let response = self
            .client
            .get(&self.table_url)
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await
            .map_err(unreachable_error)?;

        let rows = read_rows(response).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(WireSubmission::into_submission))
    }

    async fn answer(
        &self,
        id: &SubmissionId,
        answer: &str,
    ) -> Result<Option<Submission>, RepositoryError> {
        let patch = AnswerPatch {
            answer,
            is_answered: true,
            answered_at: Utc::now(),
        };

        let filter = format!("eq.{id}");
        let response = self
            .client
            .patch(&self.table_url)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(unreachable_error)?;

        let rows = read_rows(response).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(WireSubmission::into_submission))
    }
}
