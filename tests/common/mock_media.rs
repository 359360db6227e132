/*!
 * Scripted video source and transcriber
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reelingo::MediaError;
use reelingo::media::{Transcriber, Transcription, VideoMetadata, VideoSource};

/// Video source accepting `https://video.test/<id>` URLs
#[derive(Debug, Clone)]
pub struct MockVideoSource {
    pub metadata: VideoMetadata,
    /// Errors returned by `extract_audio` before it succeeds
    pub audio_failures: Arc<Mutex<VecDeque<MediaError>>>,
    pub audio_calls: Arc<AtomicUsize>,
}

impl MockVideoSource {
    pub fn new() -> Self {
        Self {
            metadata: VideoMetadata {
                duration_secs: 42.0,
                has_audio: true,
                is_short_video: true,
                audio_quality: Some("high".to_string()),
            },
            audio_failures: Arc::new(Mutex::new(VecDeque::new())),
            audio_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn without_audio(mut self) -> Self {
        self.metadata.has_audio = false;
        self
    }

    pub fn failing_audio(self, errors: Vec<MediaError>) -> Self {
        self.audio_failures.lock().extend(errors);
        self
    }

    pub fn audio_calls(&self) -> usize {
        self.audio_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    fn validate(&self, url: &str) -> bool {
        url.starts_with("https://video.test/")
    }

    fn extract_id(&self, url: &str) -> Result<String, MediaError> {
        url.strip_prefix("https://video.test/")
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| MediaError::NotFound(url.to_string()))
    }

    async fn extract_audio(&self, video_id: &str) -> Result<Bytes, MediaError> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.audio_failures.lock().pop_front() {
            return Err(error);
        }
        Ok(Bytes::from(format!("audio:{}", video_id)))
    }

    async fn metadata(&self, video_id: &str) -> Result<VideoMetadata, MediaError> {
        if video_id == "private" {
            return Err(MediaError::PrivateVideo(video_id.to_string()));
        }
        Ok(self.metadata.clone())
    }
}

/// Transcriber returning a fixed transcript
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    pub text: String,
    pub detected_language: Option<String>,
}

impl MockTranscriber {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detected_language: Some("en".to_string()),
        }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: Bytes) -> Result<Transcription, MediaError> {
        if audio.is_empty() {
            return Err(MediaError::NoAudioTrack("empty audio".to_string()));
        }
        Ok(Transcription {
            text: self.text.clone(),
            detected_language: self.detected_language.clone(),
            confidence: 0.93,
            segments: Vec::new(),
        })
    }
}
