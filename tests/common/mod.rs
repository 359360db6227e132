/*!
 * Common test utilities for the reelingo test suite
 */

use std::sync::Arc;
use std::time::Duration;

use reelingo::app_config::{Config, JobsConfig};
use reelingo::jobs::{JobId, JobOrchestrator, OrchestratorBuilder, ProcessingJob};
use reelingo::providers::mock::MockProvider;
use reelingo::translation::RetryPolicy;
use reelingo::{ProviderRegistry, TranslationService};

// Re-export the mock media collaborators
pub mod mock_media;

/// Route `log` output through env_logger so `RUST_LOG` works in tests
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Retry policy with millisecond delays so failing tests stay fast
pub fn fast_retry() -> RetryPolicy<reelingo::ProviderError> {
    RetryPolicy::translation()
        .with_base_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

/// Translation service over the given mock providers
pub fn service_with(providers: Vec<MockProvider>) -> Arc<TranslationService> {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(Arc::new(provider));
    }
    Arc::new(TranslationService::new(Arc::new(registry), &Config::default()).with_retry_policy(fast_retry()))
}

/// Jobs config with `max_concurrent_jobs` workers and a long sweep interval
pub fn jobs_config(max_concurrent_jobs: usize, queue_capacity: usize) -> JobsConfig {
    JobsConfig {
        max_concurrent_jobs,
        queue_capacity,
        ..JobsConfig::default()
    }
}

/// Started orchestrator over the given mock providers
pub fn orchestrator_with(providers: Vec<MockProvider>, config: JobsConfig) -> JobOrchestrator {
    init_test_logging();
    OrchestratorBuilder::new(service_with(providers)).config(config).start()
}

/// Poll until the job is Completed or Failed
pub async fn wait_for_terminal(orchestrator: &JobOrchestrator, id: &JobId) -> ProcessingJob {
    for _ in 0..500 {
        if let Some(job) = orchestrator.get_status(id) {
            if job.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not reach a terminal status", id);
}
