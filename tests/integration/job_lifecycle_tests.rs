/*!
 * Integration tests for job submission, progress, cancellation and shutdown
 */

use std::time::Duration;

use reelingo::jobs::{JobInput, JobStage, JobStatus};
use reelingo::providers::mock::MockProvider;
use reelingo::{JobError, Method};

use crate::common::{jobs_config, orchestrator_with, wait_for_terminal};

#[tokio::test]
async fn test_text_job_should_translate_hello_world_to_hindi() {
    let provider = MockProvider::fixed("regional", Method::Regional, "नमस्ते दुनिया");
    let orchestrator = orchestrator_with(vec![provider.clone()], jobs_config(2, 10));

    let id = orchestrator
        .submit(JobInput::text("Hello world"), "hi-IN", Some("en"), Method::Regional)
        .unwrap();
    let job = wait_for_terminal(&orchestrator, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.stage, JobStage::Completed);
    assert_eq!(job.progress, 100);
    assert!(job.error.is_none());
    let result = job.result.unwrap();
    assert_eq!(result.translated_text, "नमस्ते दुनिया");
    assert_eq!(result.source_language, "en");
    assert_eq!(result.target_language, "hi-IN");
    assert_eq!(result.method, Method::Regional);
    assert!(!result.used_fallback);
    assert!(result.translation_accuracy > 0.0);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_progress_should_never_decrease() {
    let orchestrator = orchestrator_with(vec![MockProvider::slow("regional", Method::Regional, 150)], jobs_config(1, 10));
    let id = orchestrator
        .submit(JobInput::text("Progress is monotonic."), "fr", None, Method::Regional)
        .unwrap();

    let mut seen = Vec::new();
    loop {
        let job = orchestrator.get_status(&id).unwrap();
        seen.push(job.progress);
        if job.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
    assert!(seen.contains(&70));
    assert_eq!(seen.last(), Some(&100));
}

#[tokio::test]
async fn test_worker_pool_should_cap_processing_jobs() {
    let provider = MockProvider::slow("regional", Method::Regional, 120);
    let orchestrator = orchestrator_with(vec![provider.clone()], jobs_config(2, 20));

    let ids: Vec<_> = (0..6)
        .map(|i| {
            orchestrator
                .submit(JobInput::text(format!("Job number {}.", i)), "fr", Some("en"), Method::Regional)
                .unwrap()
        })
        .collect();

    let mut max_processing = 0;
    let mut saw_waiting_while_full = false;
    loop {
        let stats = orchestrator.stats();
        max_processing = max_processing.max(stats.processing);
        if stats.processing == 2 && stats.pending > 0 {
            saw_waiting_while_full = true;
        }
        if stats.completed + stats.failed == ids.len() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(max_processing <= 2, "saw {} jobs processing", max_processing);
    assert!(saw_waiting_while_full, "surplus jobs were never observed Pending");
    assert_eq!(orchestrator.stats().completed, 6);
    assert_eq!(provider.call_count(), 6);
}

#[tokio::test]
async fn test_cancel_pending_job_should_fail_it_and_skip_work() {
    let provider = MockProvider::slow("regional", Method::Regional, 200);
    let orchestrator = orchestrator_with(vec![provider.clone()], jobs_config(1, 10));

    let running = orchestrator.submit(JobInput::text("First."), "fr", None, Method::Regional).unwrap();
    let queued = orchestrator.submit(JobInput::text("Second."), "fr", None, Method::Regional).unwrap();

    assert!(orchestrator.cancel(&queued));
    let job = orchestrator.get_status(&queued).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let failure = job.error.unwrap();
    assert_eq!(failure.message, "cancelled");
    assert!(!failure.retryable);

    wait_for_terminal(&orchestrator, &running).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(provider.call_count(), 1);
    assert_eq!(orchestrator.get_status(&queued).unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn test_cancel_processing_job_should_not_be_overwritten() {
    let orchestrator = orchestrator_with(vec![MockProvider::slow("regional", Method::Regional, 150)], jobs_config(1, 10));
    let id = orchestrator.submit(JobInput::text("Slow one."), "fr", None, Method::Regional).unwrap();

    while orchestrator.get_status(&id).unwrap().status != JobStatus::Processing {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(orchestrator.cancel(&id));

    tokio::time::sleep(Duration::from_millis(250)).await;
    let job = orchestrator.get_status(&id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.result.is_none());
}

#[tokio::test]
async fn test_cancel_finished_or_unknown_job_should_return_false() {
    let orchestrator = orchestrator_with(vec![MockProvider::working("regional", Method::Regional)], jobs_config(1, 10));
    let id = orchestrator.submit(JobInput::text("Done soon."), "fr", None, Method::Regional).unwrap();
    let before = wait_for_terminal(&orchestrator, &id).await;

    assert!(!orchestrator.cancel(&id));
    assert_eq!(orchestrator.get_status(&id).unwrap(), before);
    assert!(!orchestrator.cancel(&reelingo::JobId::new()));
}

#[tokio::test]
async fn test_full_queue_should_reject_without_registering() {
    let orchestrator = orchestrator_with(vec![MockProvider::slow("regional", Method::Regional, 300)], jobs_config(1, 1));

    let outcomes: Vec<_> = (0..4)
        .map(|i| orchestrator.submit(JobInput::text(format!("Item {}.", i)), "fr", None, Method::Regional))
        .collect();

    let accepted = outcomes.iter().filter(|o| o.is_ok()).count();
    assert!(outcomes.iter().any(|o| *o == Err(JobError::QueueFull(1))));
    assert_eq!(orchestrator.list_all().len(), accepted);
}

#[tokio::test]
async fn test_cancelled_queued_job_should_free_its_slot() {
    let orchestrator = orchestrator_with(vec![MockProvider::slow("regional", Method::Regional, 200)], jobs_config(1, 1));

    let running = orchestrator.submit(JobInput::text("Running."), "fr", None, Method::Regional).unwrap();
    while orchestrator.get_status(&running).unwrap().status != JobStatus::Processing {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let queued = orchestrator.submit(JobInput::text("Queued."), "fr", None, Method::Regional).unwrap();
    assert_eq!(
        orchestrator.submit(JobInput::text("Rejected."), "fr", None, Method::Regional),
        Err(JobError::QueueFull(1))
    );

    assert!(orchestrator.cancel(&queued));
    assert_eq!(orchestrator.stats().queue_depth, 0);

    let replacement = orchestrator
        .submit(JobInput::text("Replacement."), "fr", None, Method::Regional)
        .unwrap();
    let job = wait_for_terminal(&orchestrator, &replacement).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(orchestrator.get_status(&queued).unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn test_invalid_input_should_fail_without_retry() {
    let provider = MockProvider::working("regional", Method::Regional);
    let orchestrator = orchestrator_with(vec![provider.clone()], jobs_config(2, 10));

    let empty = orchestrator.submit(JobInput::text("   "), "fr", None, Method::Regional).unwrap();
    let bad_target = orchestrator.submit(JobInput::text("Hello"), "zz", None, Method::Regional).unwrap();

    for id in [empty, bad_target] {
        let job = wait_for_terminal(&orchestrator, &id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert!(!job.error.unwrap().retryable);
    }
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_transient_provider_failure_should_be_marked_retryable() {
    let orchestrator = orchestrator_with(vec![MockProvider::failing("regional", Method::Regional, 503)], jobs_config(1, 10));
    let id = orchestrator.submit(JobInput::text("Hello"), "fr", None, Method::Regional).unwrap();

    let job = wait_for_terminal(&orchestrator, &id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().retryable);
}

#[tokio::test]
async fn test_evict_expired_should_drop_finished_jobs() {
    let orchestrator = orchestrator_with(vec![MockProvider::working("regional", Method::Regional)], jobs_config(1, 10));
    let id = orchestrator.submit(JobInput::text("Hello"), "fr", None, Method::Regional).unwrap();
    wait_for_terminal(&orchestrator, &id).await;

    assert_eq!(orchestrator.evict_expired(Duration::from_secs(3600)), 0);
    assert_eq!(orchestrator.evict_expired(Duration::ZERO), 1);
    assert!(orchestrator.get_status(&id).is_none());
}

#[tokio::test]
async fn test_shutdown_should_fail_unfinished_jobs_and_refuse_new_ones() {
    let orchestrator = orchestrator_with(vec![MockProvider::slow("regional", Method::Regional, 500)], jobs_config(1, 10));
    let ids: Vec<_> = (0..3)
        .map(|i| {
            orchestrator
                .submit(JobInput::text(format!("Pending {}.", i)), "fr", None, Method::Regional)
                .unwrap()
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snapshot = orchestrator.shutdown().await;
    assert_eq!(snapshot.len(), 3);
    for job in &snapshot {
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_ref().unwrap().message, "shutdown");
    }

    assert!(orchestrator.is_shutting_down());
    assert!(orchestrator.get_status(&ids[0]).is_none());
    assert_eq!(
        orchestrator.submit(JobInput::text("Late."), "fr", None, Method::Regional),
        Err(JobError::ShuttingDown)
    );
}
