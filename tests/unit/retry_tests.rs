/*!
 * Tests for retry policies and the retry executor
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reelingo::translation::{RetryPolicy, execute_with_retry};
use reelingo::{MediaError, ProviderError};

fn quick<E>(policy: RetryPolicy<E>) -> RetryPolicy<E> {
    policy.with_base_delay(Duration::from_millis(1)).with_max_delay(Duration::from_millis(2))
}

#[tokio::test]
async fn test_transient_failure_should_use_every_attempt() {
    let calls = AtomicUsize::new(0);
    let result: Result<(), ProviderError> = execute_with_retry(&quick(RetryPolicy::translation()), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::from_status(503, "unavailable"))
    })
    .await;

    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 503, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_authentication_failure_should_not_retry() {
    let calls = AtomicUsize::new(0);
    let result: Result<(), ProviderError> = execute_with_retry(&quick(RetryPolicy::translation()), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::from_status(401, "bad key"))
    })
    .await;

    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_success_after_failures_should_return_value() {
    let calls = AtomicUsize::new(0);
    let result = execute_with_retry(&quick(RetryPolicy::translation()), || async {
        let attempt = calls.fetch_add(1, Ordering::SeqCst);
        if attempt < 2 {
            Err(ProviderError::RateLimitExceeded("slow down".into()))
        } else {
            Ok("done")
        }
    })
    .await;

    assert_eq!(result, Ok("done"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_private_video_should_fail_on_first_attempt() {
    let calls = AtomicUsize::new(0);
    let result: Result<(), MediaError> = execute_with_retry(&quick(RetryPolicy::video_acquisition()), || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(MediaError::PrivateVideo("abc".into()))
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_default_budget_should_be_three_attempts_doubling_from_one_second() {
    let policy = RetryPolicy::network();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
    assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(10));
}

#[test]
fn test_retry_should_run_on_blocking_executor() {
    let calls = AtomicUsize::new(0);
    let result: Result<u32, MediaError> = tokio_test::block_on(execute_with_retry(
        &quick(RetryPolicy::transcription()),
        || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MediaError::Network("timeout".into()))
            } else {
                Ok(7)
            }
        },
    ));

    assert_eq!(result.ok(), Some(7));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
