//! Computation service client.
//!
//! The ephemeris computation lives behind an HTTP service. This module
//! defines the [`ComputationService`] seam the rest of the crate talks to,
//! and [`HttpService`], its `reqwest` implementation.
//!
//! | Endpoint | Method | Body / query | Response |
//! |----------|--------|--------------|----------|
//! | `/calculate` | POST | [`CalculationRequest`] JSON | [`ResultDocument`] |
//! | `/search-astrological` | GET | non-blank criteria as query params | [`SearchOutcome`] |
//! | `/health` | GET | | `{"status": ...}` |
//!
//! Any non-2xx status is a failure. Nothing is retried here; callers decide.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use kp_transit_core::models::FULL_SWEEP_BUCKETS;
use kp_transit_core::request::CalculationRequest;
use kp_transit_core::{KpError, ResultDocument, SearchCriteria, SearchOutcome};

use crate::config::ServiceConfig;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Input(#[from] KpError),
}

impl ServiceError {
    /// HTTP status for status failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            ServiceError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Transport and service failures may succeed on a later attempt; bad
    /// input will not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ServiceError::Input(_))
    }
}

/// Service liveness response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The external computation service.
#[async_trait]
pub trait ComputationService: Send + Sync {
    async fn health(&self) -> Result<HealthStatus, ServiceError>;

    /// One single-date calculation.
    async fn calculate(&self, request: &CalculationRequest) -> Result<ResultDocument, ServiceError>;

    /// Structured lookup evaluated by the service.
    ///
    /// Empty criteria are rejected before any request is sent.
    async fn search_astrological(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<SearchOutcome, ServiceError>;
}

pub struct HttpService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpService {
    /// Client for `base_url` (trailing slash ignored) with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ComputationService for HttpService {
    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "checking service health");
        let resp = self.client.get(&url).send().await?;
        Self::read_json(resp).await
    }

    async fn calculate(&self, request: &CalculationRequest) -> Result<ResultDocument, ServiceError> {
        let url = format!("{}/calculate", self.base_url);
        debug!(url = %url, date = %request.date, "requesting calculation");
        let resp = self.client.post(&url).json(request).send().await?;
        let doc: ResultDocument = Self::read_json(resp).await?;

        let count = doc.samples().len();
        if request.include_degree_buckets && count != FULL_SWEEP_BUCKETS {
            warn!(
                date = %request.date,
                count,
                expected = FULL_SWEEP_BUCKETS,
                "degree sweep has unexpected bucket count"
            );
        }
        Ok(doc)
    }

    async fn search_astrological(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<SearchOutcome, ServiceError> {
        if criteria.is_empty() {
            return Err(KpError::EmptyCriteria.into());
        }
        let url = format!("{}/search-astrological", self.base_url);
        let params = criteria.to_query_pairs();
        debug!(url = %url, criteria = params.len(), "structured search");
        let resp = self.client.get(&url).query(&params).send().await?;
        Self::read_json(resp).await
    }
}
