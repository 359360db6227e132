/*!
 * Request-layer facade over the job orchestrator.
 *
 * Requests and views are plain serde types (camelCase JSON) so any
 * transport can sit in front of `JobApi`.
 */

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::JobError;
use crate::jobs::{JobId, JobInput, JobOrchestrator, JobStage, JobStats, JobStatus, ProcessingJob};
use crate::language_utils::Language;
use crate::providers::Method;
use crate::translation::TranslationResult;

/// Request to translate the audio of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVideoRequest {
    pub video_url: String,
    pub target_language: String,
    #[serde(default)]
    pub source_language: Option<String>,
    #[serde(default)]
    pub method: Method,
}

/// Request to translate free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateTextRequest {
    pub text: String,
    pub target_language: String,
    #[serde(default)]
    pub source_language: Option<String>,
    #[serde(default)]
    pub method: Method,
}

/// Answer to an accepted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Public view of a job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub stage: JobStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TranslationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl From<ProcessingJob> for JobStatusView {
    fn from(job: ProcessingJob) -> Self {
        let (error, retryable) = match job.error {
            Some(failure) => (Some(failure.message), Some(failure.retryable)),
            None => (None, None),
        };
        Self {
            job_id: job.id,
            status: job.status,
            progress: job.progress,
            stage: job.stage,
            result: job.result,
            error,
            retryable,
        }
    }
}

/// Entry point for request handlers
#[derive(Clone)]
pub struct JobApi {
    orchestrator: Arc<JobOrchestrator>,
}

impl JobApi {
    pub fn new(orchestrator: Arc<JobOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<JobOrchestrator> {
        &self.orchestrator
    }

    pub fn process_video(&self, request: ProcessVideoRequest) -> Result<SubmitResponse, JobError> {
        self.submit(
            JobInput::video(request.video_url),
            &request.target_language,
            request.source_language.as_deref(),
            request.method,
        )
    }

    pub fn translate_text(&self, request: TranslateTextRequest) -> Result<SubmitResponse, JobError> {
        self.submit(
            JobInput::text(request.text),
            &request.target_language,
            request.source_language.as_deref(),
            request.method,
        )
    }

    /// `None` for malformed or unknown ids
    pub fn job_status(&self, job_id: &str) -> Option<JobStatusView> {
        let id: JobId = job_id.parse().ok()?;
        self.orchestrator.get_status(&id).map(JobStatusView::from)
    }

    pub fn cancel_job(&self, job_id: &str) -> bool {
        match job_id.parse::<JobId>() {
            Ok(id) => self.orchestrator.cancel(&id),
            Err(_) => false,
        }
    }

    /// Languages offered by at least one registered provider
    pub fn supported_languages(&self) -> Vec<Language> {
        self.orchestrator.translator().registry().supported_languages()
    }

    pub fn stats(&self) -> JobStats {
        self.orchestrator.stats()
    }

    fn submit(
        &self,
        input: JobInput,
        target_language: &str,
        source_language: Option<&str>,
        method: Method,
    ) -> Result<SubmitResponse, JobError> {
        let job_id = self.orchestrator.submit(input, target_language, source_language, method)?;
        Ok(SubmitResponse {
            job_id,
            status: JobStatus::Pending,
        })
    }
}
