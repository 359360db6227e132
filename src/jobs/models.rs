/*!
 * Job records and their state machine.
 *
 * Status only moves Pending -> Processing -> {Completed | Failed}, with
 * Pending -> Failed allowed for cancellation and shutdown. Progress never
 * decreases. A job carries a result or an error, never both. The
 * transition methods enforce this and report whether they applied.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::providers::Method;
use crate::translation::TranslationResult;

/// Opaque job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// What a job translates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobInput {
    /// Text supplied directly
    Text { text: String },
    /// A video whose audio is transcribed first
    Video { url: String },
}

impl JobInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self::Video { url: url.into() }
    }
}

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Pipeline step a job is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    ValidatingInput,
    ExtractingAudio,
    Transcribing,
    Translating,
    Completed,
}

impl JobStage {
    /// Progress reported on entering the stage
    pub fn progress(&self) -> u8 {
        match self {
            JobStage::ValidatingInput => 10,
            JobStage::ExtractingAudio => 40,
            JobStage::Transcribing => 60,
            JobStage::Translating => 70,
            JobStage::Completed => 100,
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::ValidatingInput => "validating_input",
            JobStage::ExtractingAudio => "extracting_audio",
            JobStage::Transcribing => "transcribing",
            JobStage::Translating => "translating",
            JobStage::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}

/// Terminal failure recorded on a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFailure {
    pub message: String,
    /// Whether resubmitting may succeed
    pub retryable: bool,
}

/// A translation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    pub id: JobId,
    pub input: JobInput,
    pub target_language: String,
    pub source_language: Option<String>,
    pub method: Method,
    pub status: JobStatus,
    pub stage: JobStage,
    pub progress: u8,
    pub result: Option<TranslationResult>,
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingJob {
    /// A new Pending job
    pub fn new(input: JobInput, target_language: impl Into<String>, source_language: Option<String>, method: Method) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            input,
            target_language: target_language.into(),
            source_language,
            method,
            status: JobStatus::Pending,
            stage: JobStage::ValidatingInput,
            progress: 0,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Pending -> Processing, entering input validation
    pub fn start(&mut self) -> bool {
        if self.status != JobStatus::Pending {
            return false;
        }
        self.status = JobStatus::Processing;
        self.stage = JobStage::ValidatingInput;
        self.progress = self.progress.max(JobStage::ValidatingInput.progress());
        self.touch();
        true
    }

    /// Move to a later stage while Processing
    pub fn advance(&mut self, stage: JobStage) -> bool {
        if self.status != JobStatus::Processing || stage < self.stage || stage == JobStage::Completed {
            return false;
        }
        self.stage = stage;
        self.progress = self.progress.max(stage.progress());
        self.touch();
        true
    }

    /// Processing -> Completed with `result`
    pub fn complete(&mut self, result: TranslationResult) -> bool {
        if self.status != JobStatus::Processing {
            return false;
        }
        self.status = JobStatus::Completed;
        self.stage = JobStage::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.error = None;
        self.touch();
        true
    }

    /// Pending or Processing -> Failed
    pub fn fail(&mut self, message: impl Into<String>, retryable: bool) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.result = None;
        self.error = Some(JobFailure {
            message: message.into(),
            retryable,
        });
        self.touch();
        true
    }
}
