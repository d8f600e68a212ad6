use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::candidate::{
    CandidateDetail, CandidateListData, CandidateSummary, CandidateUpdate, SearchData, SearchHit,
    Stats,
};
use crate::models::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("API returned no data: {0}")]
    EmptyData(String),
}

/// Backend surface the review controller talks to. Split out as a trait so
/// controller-driver tests can run against a scripted fake instead of a
/// live server.
#[async_trait]
pub trait CandidateApi: Send + Sync {
    async fn list_candidates(&self) -> Result<Vec<CandidateSummary>, ApiClientError>;
    async fn get_candidate(&self, id: i64) -> Result<CandidateDetail, ApiClientError>;
    async fn update_candidate(
        &self,
        id: i64,
        patch: &CandidateUpdate,
    ) -> Result<CandidateDetail, ApiClientError>;
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ApiClientError>;
    async fn stats(&self) -> Result<Stats, ApiClientError>;
}

/// `CandidateApi` implementation over the server's envelope API.
pub struct HttpCandidateApi {
    base_url: String,
    http: Client,
}

impl HttpCandidateApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpCandidateApi {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Unwraps the `{status, message, data}` envelope, turning a false status or
/// an error response into `ApiClientError::Api` with the server's message.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiClientError> {
    let status = response.status();
    let envelope: ApiResponse<T> = response.json().await?;
    if !status.is_success() || !envelope.status {
        return Err(ApiClientError::Api {
            status: status.as_u16(),
            message: envelope.message,
        });
    }
    envelope
        .data
        .ok_or(ApiClientError::EmptyData(envelope.message))
}

#[async_trait]
impl CandidateApi for HttpCandidateApi {
    async fn list_candidates(&self) -> Result<Vec<CandidateSummary>, ApiClientError> {
        let response = self.http.get(self.url("/api/candidates")).send().await?;
        let data: CandidateListData = decode(response).await?;
        Ok(data.candidates)
    }

    async fn get_candidate(&self, id: i64) -> Result<CandidateDetail, ApiClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/candidates/{id}")))
            .send()
            .await?;
        decode(response).await
    }

    async fn update_candidate(
        &self,
        id: i64,
        patch: &CandidateUpdate,
    ) -> Result<CandidateDetail, ApiClientError> {
        let response = self
            .http
            .patch(self.url(&format!("/api/candidates/{id}")))
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ApiClientError> {
        let response = self
            .http
            .get(self.url("/api/search"))
            .query(&[("q", query)])
            .send()
            .await?;
        let data: SearchData = decode(response).await?;
        Ok(data.candidates)
    }

    async fn stats(&self) -> Result<Stats, ApiClientError> {
        let response = self.http.get(self.url("/api/stats")).send().await?;
        decode(response).await
    }
}
