//! Client for the external survey-collection API

use crate::config::SurveyConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

/// Timestamp format the survey server uses in submission times and filters
pub const SUBMISSION_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors from the survey API client
#[derive(Debug, thiserror::Error)]
pub enum SurveyApiError {
    /// The server answered with a non-2xx status
    #[error("survey server returned {status} for {url}: {message}")]
    Api {
        status: u16,
        message: String,
        url: String,
    },
    /// The server answered 2xx but the body was not what we expected
    #[error("survey response from {url} could not be parsed: {message}")]
    Malformed { url: String, message: String },
    /// Transport-level failure reaching the server
    #[error("error connecting to survey server: {0}")]
    Connection(#[from] reqwest::Error),
}

impl SurveyApiError {
    /// Connection-level errors abort a polling run; the next scheduled run
    /// retries from the checkpoint.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Read access to the survey server, mockable for tests
#[async_trait]
pub trait SurveyApi: Send + Sync {
    /// Fetch the schema definition of a form (choice lists, field types)
    async fn get_form_definition(&self, form_id: i64) -> Result<Value, SurveyApiError>;

    /// Fetch submissions for a form, server-side filtered to those strictly
    /// newer than `since`
    async fn get_form_submissions(
        &self,
        form_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Value>, SurveyApiError>;
}

/// Simple client for the survey REST API
pub struct SurveyApiClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl SurveyApiClient {
    pub fn new(config: &SurveyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    async fn get(&self, path: &str, query: Option<(&str, String)>) -> Result<Value, SurveyApiError> {
        let url = format!("{}/api/v1/{}", self.base_url, path);
        let mut request = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Token {}", self.api_token));
        if let Some((key, value)) = query {
            request = request.query(&[(key, value)]);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let data: Value = serde_json::from_str(&body).map_err(|e| SurveyApiError::Malformed {
            url: url.clone(),
            message: e.to_string(),
        })?;
        if !status.is_success() {
            let message = data
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or("Unexpected error")
                .to_string();
            return Err(SurveyApiError::Api {
                status: status.as_u16(),
                message,
                url,
            });
        }
        Ok(data)
    }
}

#[async_trait]
impl SurveyApi for SurveyApiClient {
    async fn get_form_definition(&self, form_id: i64) -> Result<Value, SurveyApiError> {
        self.get(&format!("forms/{form_id}/form"), None).await
    }

    async fn get_form_submissions(
        &self,
        form_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Value>, SurveyApiError> {
        let query = since.map(|since| {
            (
                "query",
                format!(
                    "{{\"_submission_time\": {{\"$gt\": \"{}\"}}}}",
                    since.format(SUBMISSION_TIME_FORMAT)
                ),
            )
        });
        let path = format!("data/{form_id}");
        let data = self.get(&path, query).await?;
        match data {
            Value::Array(items) => Ok(items),
            _ => Err(SurveyApiError::Malformed {
                url: format!("{}/api/v1/{}", self.base_url, path),
                message: "expected a list of submissions".to_string(),
            }),
        }
    }
}
