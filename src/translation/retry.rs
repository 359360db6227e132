/*!
 * Bounded exponential-backoff retry.
 *
 * `execute_with_retry` runs a fallible async operation until it succeeds, the
 * attempt budget is spent, or the policy's predicate rejects the error. The
 * named constructors carry the retry rules for each class of operation the
 * pipeline performs.
 */

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::app_config::TranslationCommonConfig;
use crate::errors::{MediaError, ProviderError};

/// Retry configuration for one class of operation
#[derive(Debug)]
pub struct RetryPolicy<E> {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Returns true when the error is worth another attempt
    pub retry_condition: fn(&E) -> bool,
}

// Manual impls: derive would demand `E: Clone` for a struct that only holds `fn(&E)`
impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for RetryPolicy<E> {}

impl<E> RetryPolicy<E> {
    /// Create a policy with the default budget (3 attempts, 1s base, 10s cap, x2)
    pub fn new(retry_condition: fn(&E) -> bool) -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_factor: 2.0,
            retry_condition,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Apply the retry settings from the common translation config
    pub fn with_config(self, config: &TranslationCommonConfig) -> Self {
        self.with_max_attempts(config.retry_count)
            .with_base_delay(Duration::from_millis(config.retry_backoff_ms))
            .with_max_delay(Duration::from_millis(config.max_backoff_ms))
            .with_backoff_factor(config.backoff_factor)
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let scaled_ms = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
        if !scaled_ms.is_finite() || scaled_ms >= self.max_delay.as_millis() as f64 {
            self.max_delay
        } else {
            Duration::from_millis(scaled_ms.max(0.0).round() as u64)
        }
    }

    pub fn should_retry(&self, error: &E) -> bool {
        (self.retry_condition)(error)
    }
}

impl RetryPolicy<ProviderError> {
    /// Translation calls: throttling, 5xx and transport failures are retried;
    /// 401/403 and 400/422 are not.
    pub fn translation() -> Self {
        Self::new(is_retryable_translation_error)
    }

    /// Generic transport calls: anything that looks like a network or 5xx failure
    pub fn network() -> Self {
        Self::new(is_retryable_network_error)
    }
}

impl RetryPolicy<MediaError> {
    /// Video acquisition: private and missing videos are final
    pub fn video_acquisition() -> Self {
        Self::new(is_retryable_video_error)
    }

    /// Transcription: bad audio is final
    pub fn transcription() -> Self {
        Self::new(is_retryable_transcription_error)
    }
}

pub fn is_retryable_translation_error(error: &ProviderError) -> bool {
    error.is_retryable()
}

pub fn is_retryable_network_error(error: &ProviderError) -> bool {
    match error {
        ProviderError::ConnectionError(_) | ProviderError::RequestFailed(_) | ProviderError::RateLimitExceeded(_) => true,
        ProviderError::ApiError { status_code, .. } => *status_code >= 500,
        _ => false,
    }
}

pub fn is_retryable_video_error(error: &MediaError) -> bool {
    match error {
        MediaError::PrivateVideo(_) | MediaError::NotFound(_) => false,
        MediaError::Other(message) => {
            let lower = message.to_lowercase();
            !(lower.contains("private video") || lower.contains("not found"))
        }
        _ => true,
    }
}

pub fn is_retryable_transcription_error(error: &MediaError) -> bool {
    match error {
        MediaError::InvalidAudioFormat(_) | MediaError::NoAudioTrack(_) => false,
        MediaError::Other(message) => {
            let lower = message.to_lowercase();
            !(lower.contains("invalid audio format") || lower.contains("no audio track"))
        }
        _ => true,
    }
}

/// Run `operation` under `policy`, re-raising the last error when the budget is
/// spent or the error is not retryable.
pub async fn execute_with_retry<T, E, F, Fut>(policy: &RetryPolicy<E>, mut operation: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("Operation succeeded on attempt {}/{}", attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt >= max_attempts {
                    warn!("Giving up after {} attempts: {}", attempt, error);
                    return Err(error);
                }
                if !policy.should_retry(&error) {
                    debug!("Error is not retryable, stopping at attempt {}: {}", attempt, error);
                    return Err(error);
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    "Attempt {}/{} failed: {} - retrying in {:?}",
                    attempt, max_attempts, error, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
