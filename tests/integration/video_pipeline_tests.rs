/*!
 * Integration tests for video jobs through the media collaborators
 */

use std::sync::Arc;
use std::time::Duration;

use reelingo::api::{JobApi, ProcessVideoRequest};
use reelingo::jobs::{JobInput, JobOrchestrator, JobStatus, OrchestratorBuilder};
use reelingo::providers::mock::MockProvider;
use reelingo::translation::RetryPolicy;
use reelingo::{MediaError, Method};

use crate::common::mock_media::{MockTranscriber, MockVideoSource};
use crate::common::{init_test_logging, jobs_config, service_with, wait_for_terminal};

fn video_orchestrator(source: MockVideoSource, provider: MockProvider) -> JobOrchestrator {
    init_test_logging();
    let fast = |policy: RetryPolicy<MediaError>| policy.with_base_delay(Duration::from_millis(1));
    OrchestratorBuilder::new(service_with(vec![provider]))
        .config(jobs_config(2, 10))
        .video_source(Arc::new(source))
        .transcriber(Arc::new(MockTranscriber::new("Hello world")))
        .media_retry_policies(fast(RetryPolicy::video_acquisition()), fast(RetryPolicy::transcription()))
        .start()
}

#[tokio::test]
async fn test_video_job_should_transcribe_then_translate() {
    let provider = MockProvider::fixed("regional", Method::Regional, "नमस्ते दुनिया");
    let orchestrator = video_orchestrator(MockVideoSource::new(), provider.clone());

    let id = orchestrator
        .submit(JobInput::video("https://video.test/abc123"), "hi-IN", None, Method::Regional)
        .unwrap();
    let job = wait_for_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    let result = job.result.unwrap();
    assert_eq!(result.translated_text, "नमस्ते दुनिया");
    // Detected by the transcriber
    assert_eq!(result.source_language, "en");
    assert_eq!(provider.calls()[0].text, "Hello world");
}

#[tokio::test]
async fn test_video_job_should_pass_through_media_stages() {
    let orchestrator = video_orchestrator(MockVideoSource::new(), MockProvider::slow("regional", Method::Regional, 100));
    let id = orchestrator
        .submit(JobInput::video("https://video.test/stages"), "fr", Some("en"), Method::Regional)
        .unwrap();

    let mut seen = Vec::new();
    loop {
        let job = orchestrator.get_status(&id).unwrap();
        if seen.last() != Some(&job.progress) {
            seen.push(job.progress);
        }
        if job.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    assert!(seen.windows(2).all(|w| w[0] < w[1]), "{:?}", seen);
    assert!(seen.contains(&70));
    assert_eq!(seen.last(), Some(&100));
}

#[tokio::test]
async fn test_transient_audio_failures_should_be_retried() {
    let source = MockVideoSource::new().failing_audio(vec![
        MediaError::Network("reset".into()),
        MediaError::Network("reset again".into()),
    ]);
    let calls = source.clone();
    let orchestrator = video_orchestrator(source, MockProvider::working("regional", Method::Regional));

    let id = orchestrator
        .submit(JobInput::video("https://video.test/flaky"), "fr", None, Method::Regional)
        .unwrap();
    let job = wait_for_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(calls.audio_calls(), 3);
}

#[tokio::test]
async fn test_private_video_should_fail_without_retry() {
    let source = MockVideoSource::new();
    let calls = source.clone();
    let orchestrator = video_orchestrator(source, MockProvider::working("regional", Method::Regional));

    let id = orchestrator
        .submit(JobInput::video("https://video.test/private"), "fr", None, Method::Regional)
        .unwrap();
    let job = wait_for_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Failed);
    let failure = job.error.unwrap();
    assert!(failure.message.contains("private"));
    assert!(!failure.retryable);
    assert_eq!(calls.audio_calls(), 0);
}

#[tokio::test]
async fn test_silent_video_should_fail_validation() {
    let orchestrator = video_orchestrator(MockVideoSource::new().without_audio(), MockProvider::working("regional", Method::Regional));
    let id = orchestrator
        .submit(JobInput::video("https://video.test/silent"), "fr", None, Method::Regional)
        .unwrap();
    let job = wait_for_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(!job.error.unwrap().retryable);
}

#[tokio::test]
async fn test_api_should_reject_unsupported_url_through_job_status() {
    let orchestrator = Arc::new(video_orchestrator(MockVideoSource::new(), MockProvider::working("regional", Method::Regional)));
    let api = JobApi::new(Arc::clone(&orchestrator));

    let submitted = api
        .process_video(ProcessVideoRequest {
            video_url: "https://elsewhere.test/watch?v=1".to_string(),
            target_language: "fr".to_string(),
            source_language: None,
            method: Method::Regional,
        })
        .unwrap();
    assert_eq!(submitted.status, JobStatus::Pending);

    let job = wait_for_terminal(&orchestrator, &submitted.job_id).await;
    assert_eq!(job.status, JobStatus::Failed);

    let view = api.job_status(&submitted.job_id.to_string()).unwrap();
    assert_eq!(view.status, JobStatus::Failed);
    assert!(view.error.unwrap().contains("Unsupported video URL"));
    assert!(api.job_status("not-a-job-id").is_none());
    assert!(!api.supported_languages().is_empty());
}
