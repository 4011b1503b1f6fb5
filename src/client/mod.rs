// HTTP client for the wizard backend API

use async_trait::async_trait;

use crate::catalog::QuestionCatalog;
use crate::error::WizardError;
use crate::generation::StatusSource;
use crate::models::JobStatusReport;
use crate::wizard::anonymization::{sanitize, AnonymMapping, AnonymizeBody};
use crate::wizard::submission::CadrageSubmission;

/// Sink accepting the cadrage submission (the backend in production)
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit_cadrage(
        &self,
        project_id: &str,
        submission: &CadrageSubmission,
    ) -> Result<(), WizardError>;
}

/// Backend API client. All failures to reach the backend are transient;
/// job-level failures only ever arrive through the status report.
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Extract the backend's error detail from a non-2xx response body
    fn error_detail(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v["detail"].as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| body.to_string())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, WizardError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(WizardError::Transient(format!(
            "backend returned {}: {}",
            status,
            Self::error_detail(&body)
        )))
    }

    /// Fetch the cadrage questions for a project (ordinary questions plus
    /// the reserved verbosity question)
    pub async fn get_questions(&self, project_id: &str) -> Result<QuestionCatalog, WizardError> {
        let url = self.url(&format!("/api/projects/{}/questions", project_id));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| WizardError::Transient(e.to_string()))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| WizardError::Transient(format!("invalid questions response: {}", e)))
    }

    /// Send the anonymisation mapping table. Incomplete rows are dropped
    /// before sending.
    pub async fn submit_anonymization(
        &self,
        project_id: &str,
        mappings: &[AnonymMapping],
    ) -> Result<(), WizardError> {
        let url = self.url(&format!("/api/projects/{}/anonymize", project_id));
        let body = AnonymizeBody {
            mappings: sanitize(mappings),
        };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WizardError::Transient(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    /// Kick off the generation job
    pub async fn start_generation(&self, project_id: &str) -> Result<(), WizardError> {
        let url = self.url(&format!("/api/projects/{}/generate", project_id));
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| WizardError::Transient(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionSink for BackendClient {
    async fn submit_cadrage(
        &self,
        project_id: &str,
        submission: &CadrageSubmission,
    ) -> Result<(), WizardError> {
        let url = self.url(&format!("/api/projects/{}/cadrage", project_id));
        let response = self
            .http
            .post(&url)
            .json(submission)
            .send()
            .await
            .map_err(|e| WizardError::Transient(e.to_string()))?;
        Self::check(response).await?;
        log::info!(
            "cadrage submitted for project {} (verbosity {})",
            project_id,
            submission.verbosity_level
        );
        Ok(())
    }
}

#[async_trait]
impl StatusSource for BackendClient {
    async fn fetch_status(&self, project_id: &str) -> Result<JobStatusReport, WizardError> {
        let url = self.url(&format!("/api/projects/{}/status", project_id));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| WizardError::Transient(e.to_string()))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| WizardError::Transient(format!("invalid status response: {}", e)))
    }
}
