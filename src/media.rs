/*!
 * Contracts of the media collaborators.
 *
 * Video acquisition and speech-to-text live outside this crate. The job
 * orchestrator consumes them through these traits, each call wrapped in
 * the matching retry policy.
 */

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::MediaError;

/// Facts about a video needed before extracting audio
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    /// Duration in seconds
    pub duration_secs: f64,
    pub has_audio: bool,
    pub is_short_video: bool,
    /// Free-form quality label ("high", "medium", ...)
    pub audio_quality: Option<String>,
}

/// A timed piece of a transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Output of the transcriber
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub text: String,
    /// Detected language tag, if the engine reports one
    pub detected_language: Option<String>,
    /// Engine confidence in [0, 1]
    pub confidence: f32,
    pub segments: Vec<TranscriptSegment>,
}

/// Video acquisition service
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Whether `url` is something this source can handle
    fn validate(&self, url: &str) -> bool;

    /// Extract the video id from `url`
    fn extract_id(&self, url: &str) -> Result<String, MediaError>;

    /// Download the audio track of a video
    async fn extract_audio(&self, video_id: &str) -> Result<Bytes, MediaError>;

    /// Fetch metadata for a video
    async fn metadata(&self, video_id: &str) -> Result<VideoMetadata, MediaError>;
}

/// Speech-to-text engine
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Bytes) -> Result<Transcription, MediaError>;
}
