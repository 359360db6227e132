/*!
 * Background job orchestrator.
 *
 * Submitted jobs are queued on a channel and picked up by a fixed pool of
 * worker tasks, so no more than `max_concurrent_jobs` jobs are ever
 * Processing. Admission is bounded by the number of Pending jobs in the
 * registry: a cancelled job frees its slot at once, and its id is skipped
 * when a worker dequeues it. Each job runs the stage pipeline:
 *
 * ```text
 * ValidatingInput (10) -> ExtractingAudio (40) -> Transcribing (60) -> Translating (70) -> Completed (100)
 * ```
 *
 * Text jobs skip the two media stages. A sweeper task periodically evicts
 * finished jobs past their retention.
 */

use futures::future::join_all;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app_config::JobsConfig;
use crate::errors::{JobError, MediaError, TranslationError};
use crate::language_utils;
use crate::media::{Transcriber, VideoSource};
use crate::providers::Method;
use crate::translation::{RetryPolicy, TranslationResult, TranslationService, execute_with_retry};

use super::models::{JobId, JobInput, JobStage, ProcessingJob};
use super::registry::{JobRegistry, JobStats};

/// Builder for a running [`JobOrchestrator`]
pub struct OrchestratorBuilder {
    translator: Arc<TranslationService>,
    config: JobsConfig,
    video_source: Option<Arc<dyn VideoSource>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    video_policy: RetryPolicy<MediaError>,
    transcription_policy: RetryPolicy<MediaError>,
}

impl OrchestratorBuilder {
    pub fn new(translator: Arc<TranslationService>) -> Self {
        Self {
            translator,
            config: JobsConfig::default(),
            video_source: None,
            transcriber: None,
            video_policy: RetryPolicy::video_acquisition(),
            transcription_policy: RetryPolicy::transcription(),
        }
    }

    pub fn config(mut self, config: JobsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn video_source(mut self, source: Arc<dyn VideoSource>) -> Self {
        self.video_source = Some(source);
        self
    }

    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Override the retry policies wrapping the media collaborators
    pub fn media_retry_policies(
        mut self,
        video: RetryPolicy<MediaError>,
        transcription: RetryPolicy<MediaError>,
    ) -> Self {
        self.video_policy = video;
        self.transcription_policy = transcription;
        self
    }

    /// Spawn the worker pool and the sweeper. Must be called inside a tokio runtime.
    pub fn start(self) -> JobOrchestrator {
        let worker_count = self.config.max_concurrent_jobs.max(1);
        let capacity = self.config.queue_capacity.max(1);
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let shutdown = CancellationToken::new();

        let pipeline = Arc::new(Pipeline {
            registry: Arc::new(JobRegistry::new()),
            translator: self.translator,
            video_source: self.video_source,
            transcriber: self.transcriber,
            video_policy: self.video_policy,
            transcription_policy: self.transcription_policy,
        });

        let mut tasks: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|worker| {
                tokio::spawn(worker_loop(
                    worker,
                    Arc::clone(&pipeline),
                    Arc::clone(&receiver),
                    shutdown.clone(),
                ))
            })
            .collect();

        tasks.push(tokio::spawn(sweeper_loop(
            Arc::clone(&pipeline.registry),
            Duration::from_secs(self.config.cleanup_interval_secs.max(1)),
            Duration::from_secs(self.config.retention_secs),
            shutdown.clone(),
        )));

        info!(
            "Job orchestrator started with {} worker(s), queue capacity {}",
            worker_count, capacity
        );

        JobOrchestrator {
            pipeline,
            sender: Mutex::new(Some(sender)),
            shutdown,
            tasks: Mutex::new(tasks),
            capacity,
        }
    }
}

/// Accepts jobs and runs them in the background
pub struct JobOrchestrator {
    pipeline: Arc<Pipeline>,
    sender: Mutex<Option<mpsc::UnboundedSender<JobId>>>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    capacity: usize,
}

impl JobOrchestrator {
    /// Queue a job and return its id immediately
    pub fn submit(
        &self,
        input: JobInput,
        target_language: &str,
        source_language: Option<&str>,
        method: Method,
    ) -> Result<JobId, JobError> {
        if self.shutdown.is_cancelled() {
            return Err(JobError::ShuttingDown);
        }
        let sender = self.sender.lock().clone().ok_or(JobError::ShuttingDown)?;

        let job = ProcessingJob::new(input, target_language, source_language.map(str::to_string), method);
        let id = job.id;
        // Registered before sending so a fast worker always finds it
        if !self.pipeline.registry.insert_if_room(job, self.shutdown.child_token(), self.capacity) {
            warn!("Rejected job: queue is full ({} queued)", self.capacity);
            return Err(JobError::QueueFull(self.capacity));
        }

        match sender.send(id) {
            Ok(()) => {
                debug!("Queued job {} ({} -> {})", id, method, target_language);
                Ok(id)
            }
            Err(_) => {
                self.pipeline.registry.remove(&id);
                Err(JobError::ShuttingDown)
            }
        }
    }

    pub fn get_status(&self, id: &JobId) -> Option<ProcessingJob> {
        self.pipeline.registry.get(id)
    }

    /// Fail a Pending or Processing job; false for finished or unknown jobs
    pub fn cancel(&self, id: &JobId) -> bool {
        let cancelled = self.pipeline.registry.fail_and_cancel(id, "cancelled");
        if cancelled {
            info!("Cancelled job {}", id);
        }
        cancelled
    }

    pub fn list_all(&self) -> Vec<ProcessingJob> {
        self.pipeline.registry.list()
    }

    pub fn stats(&self) -> JobStats {
        self.pipeline.registry.stats()
    }

    /// Evict finished jobs last updated at least `retention` ago
    pub fn evict_expired(&self, retention: Duration) -> usize {
        self.pipeline.registry.evict_expired(retention)
    }

    pub fn translator(&self) -> &Arc<TranslationService> {
        &self.pipeline.translator
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop accepting jobs, fail every unfinished one with "shutdown" and stop
    /// the workers. Returns the final state of all jobs.
    pub async fn shutdown(&self) -> Vec<ProcessingJob> {
        self.shutdown.cancel();
        self.sender.lock().take();

        let snapshot = self.pipeline.registry.fail_all_active("shutdown");

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        for outcome in join_all(tasks).await {
            if let Err(e) = outcome {
                if e.is_panic() {
                    error!("Worker panicked during shutdown: {}", e);
                }
            }
        }

        self.pipeline.registry.clear();
        info!("Job orchestrator stopped ({} job(s) in final snapshot)", snapshot.len());
        snapshot
    }
}

impl Drop for JobOrchestrator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// State shared by the workers
struct Pipeline {
    registry: Arc<JobRegistry>,
    translator: Arc<TranslationService>,
    video_source: Option<Arc<dyn VideoSource>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    video_policy: RetryPolicy<MediaError>,
    transcription_policy: RetryPolicy<MediaError>,
}

/// Text and source language ready for translation
struct PreparedInput {
    text: String,
    source_language: Option<String>,
}

impl Pipeline {
    async fn run_job(&self, id: JobId) {
        let (Some(job), Some(cancel)) = (self.registry.get(&id), self.registry.token(&id)) else {
            debug!("Job {} disappeared before a worker picked it up", id);
            return;
        };
        if self.registry.update(&id, ProcessingJob::start) != Some(true) {
            debug!("Skipping job {} ({})", id, job.status);
            return;
        }

        match self.process(&job, &cancel).await {
            Ok(result) => {
                let accuracy = result.translation_accuracy;
                if self.registry.update(&id, |job| job.complete(result)) == Some(true) {
                    info!("Job {} completed (accuracy {:.1})", id, accuracy);
                } else {
                    debug!("Job {} finished after it was already terminal", id);
                }
            }
            Err(e) => {
                let retryable = e.is_retryable();
                if self.registry.update(&id, |job| job.fail(e.to_string(), retryable)) == Some(true) {
                    warn!("Job {} failed: {}", id, e);
                } else {
                    debug!("Job {} stopped: {}", id, e);
                }
            }
        }
    }

    async fn process(&self, job: &ProcessingJob, cancel: &CancellationToken) -> Result<TranslationResult, TranslationError> {
        let target = job.target_language.trim();
        if target.is_empty() {
            return Err(TranslationError::Validation("Target language is required".to_string()));
        }
        language_utils::validate_language_tag(target).map_err(|e| TranslationError::Validation(e.to_string()))?;

        let prepared = match &job.input {
            JobInput::Text { text } => {
                if text.trim().is_empty() {
                    return Err(TranslationError::Validation("Text to translate is empty".to_string()));
                }
                PreparedInput {
                    text: text.clone(),
                    source_language: job.source_language.clone(),
                }
            }
            JobInput::Video { url } => self.transcribe_video(job, url, cancel).await?,
        };

        self.enter_stage(&job.id, JobStage::Translating, cancel)?;
        self.translator
            .translate_with_cancellation(&prepared.text, target, prepared.source_language.as_deref(), job.method, cancel)
            .await
    }

    async fn transcribe_video(
        &self,
        job: &ProcessingJob,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<PreparedInput, TranslationError> {
        let (Some(source), Some(transcriber)) = (&self.video_source, &self.transcriber) else {
            return Err(TranslationError::Configuration(
                "Video jobs need a video source and a transcriber".to_string(),
            ));
        };

        if !source.validate(url) {
            return Err(TranslationError::Validation(format!("Unsupported video URL: {}", url)));
        }
        let video_id = source.extract_id(url)?;
        let metadata = until_cancelled(cancel, execute_with_retry(&self.video_policy, || source.metadata(&video_id))).await?;
        if !metadata.has_audio {
            return Err(MediaError::NoAudioTrack(video_id).into());
        }

        self.enter_stage(&job.id, JobStage::ExtractingAudio, cancel)?;
        let audio =
            until_cancelled(cancel, execute_with_retry(&self.video_policy, || source.extract_audio(&video_id))).await?;
        debug!("Extracted {} bytes of audio for video {}", audio.len(), video_id);

        self.enter_stage(&job.id, JobStage::Transcribing, cancel)?;
        let transcription = until_cancelled(
            cancel,
            execute_with_retry(&self.transcription_policy, || transcriber.transcribe(audio.clone())),
        )
        .await?;
        if transcription.text.trim().is_empty() {
            return Err(TranslationError::Validation(format!("Transcription of video {} is empty", video_id)));
        }

        Ok(PreparedInput {
            text: transcription.text,
            source_language: job.source_language.clone().or(transcription.detected_language),
        })
    }

    fn enter_stage(&self, id: &JobId, stage: JobStage, cancel: &CancellationToken) -> Result<(), TranslationError> {
        if cancel.is_cancelled() {
            return Err(TranslationError::Cancelled(format!("job cancelled before {}", stage)));
        }
        self.registry.update(id, |job| job.advance(stage));
        Ok(())
    }
}

/// Race a media call against the job's token
async fn until_cancelled<T, F>(cancel: &CancellationToken, call: F) -> Result<T, TranslationError>
where
    F: Future<Output = Result<T, MediaError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TranslationError::Cancelled("job cancelled".to_string())),
        outcome = call => outcome.map_err(TranslationError::from),
    }
}

async fn worker_loop(
    worker: usize,
    pipeline: Arc<Pipeline>,
    receiver: Arc<AsyncMutex<mpsc::UnboundedReceiver<JobId>>>,
    shutdown: CancellationToken,
) {
    debug!("Worker {} started", worker);
    loop {
        let next = {
            let mut receiver = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                guard = receiver.lock() => guard,
            };
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                id = receiver.recv() => id,
            }
        };

        match next {
            Some(id) => pipeline.run_job(id).await,
            None => break,
        }
    }
    debug!("Worker {} stopped", worker);
}

async fn sweeper_loop(registry: Arc<JobRegistry>, every: Duration, retention: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let evicted = registry.evict_expired(retention);
                if evicted > 0 {
                    info!("Sweeper evicted {} expired job(s)", evicted);
                }
            }
        }
    }
}
