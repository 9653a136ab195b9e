// ABOUTME: Bounded exponential backoff wrapper around LlmProvider::complete
// ABOUTME: Retries only on rate-limit signals; every other error fails immediately
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # Completion Retry Policy
//!
//! Model calls are expensive, so blind retries are forbidden: only transient
//! rate-limit responses are retried, with bounded exponential backoff plus
//! jitter. Auth failures, malformed requests, timeouts, and parse failures
//! all surface on the first attempt.

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{ChatRequest, ChatResponse, LlmProvider};
use crate::constants::limits;
use crate::errors::{AppError, AppResult};

/// Message fragments that identify a rate-limit error when the provider does
/// not surface a clean 429 status
const RATE_LIMIT_PATTERNS: &[&str] = &["rate limit", "rate_limit", "too many requests", "429"];

/// Whether an error should be treated as a transient rate-limit signal
///
/// Checks the structured error code first, then falls back to message
/// pattern matching for providers that tunnel 429s through generic errors.
#[must_use]
pub fn looks_rate_limited(error: &AppError) -> bool {
    if error.is_rate_limited() {
        return true;
    }

    let message = error.message.to_lowercase();
    RATE_LIMIT_PATTERNS.iter().any(|p| message.contains(p))
}

/// Backoff duration before the given retry attempt (1-based)
fn backoff_for_attempt(attempt: u32) -> Duration {
    let exp = limits::INITIAL_BACKOFF_MS.saturating_mul(1_u64 << (attempt.saturating_sub(1)));
    let base = exp.min(limits::MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..limits::BACKOFF_JITTER_MS);
    Duration::from_millis(base + jitter)
}

/// Perform a chat completion with bounded retry on rate limits
///
/// At most [`limits::MAX_COMPLETION_ATTEMPTS`] attempts are made; exhausted
/// retries surface the last rate-limit error as the failure.
///
/// # Errors
///
/// Returns the provider's error unchanged for any non-rate-limit failure, or
/// the final rate-limit error once attempts are exhausted.
pub async fn complete_with_retry(
    provider: &dyn LlmProvider,
    request: &ChatRequest,
) -> AppResult<ChatResponse> {
    let mut attempt = 1;

    loop {
        match provider.complete(request).await {
            Ok(response) => return Ok(response),
            Err(error) if looks_rate_limited(&error) && attempt < limits::MAX_COMPLETION_ATTEMPTS => {
                let delay = backoff_for_attempt(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited by {}, backing off",
                    provider.display_name()
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                debug!(attempt, "completion failed without retry: {}", error);
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[test]
    fn test_rate_limit_classification_by_code() {
        assert!(looks_rate_limited(&AppError::rate_limited("Groq", "slow")));
        assert!(!looks_rate_limited(&AppError::external_auth(
            "Groq", "bad key"
        )));
    }

    #[test]
    fn test_rate_limit_classification_by_message() {
        let tunneled = AppError::external_service("Gateway", "upstream said Too Many Requests");
        assert!(looks_rate_limited(&tunneled));

        let other = AppError::external_service("Gateway", "connection reset");
        assert!(!looks_rate_limited(&other));
    }

    #[test]
    fn test_backoff_growth_is_bounded() {
        let first = backoff_for_attempt(1).as_millis() as u64;
        let second = backoff_for_attempt(2).as_millis() as u64;
        assert!(first >= limits::INITIAL_BACKOFF_MS);
        assert!(second >= 2 * limits::INITIAL_BACKOFF_MS);

        let huge = backoff_for_attempt(30).as_millis() as u64;
        assert!(huge <= limits::MAX_BACKOFF_MS + limits::BACKOFF_JITTER_MS);
    }
}
