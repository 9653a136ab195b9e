// ABOUTME: Integration tests for the completion retry policy
// ABOUTME: Scripted provider verifies rate-limit recovery, exhaustion, and fail-fast paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::ScriptedProvider;
use plansmith::constants::limits;
use plansmith::errors::AppError;
use plansmith::llm::{complete_with_retry, ChatMessage, ChatRequest};

fn request() -> ChatRequest {
    ChatRequest::new(vec![ChatMessage::user("write out week 1")])
}

// Paused clock: the backoff sleeps auto-advance instead of burning wall time.

#[tokio::test(start_paused = true)]
async fn test_rate_limited_call_retries_until_success() {
    let provider = ScriptedProvider::new();
    provider.push_error(AppError::rate_limited("Groq", "requests per minute exceeded"));
    provider.push_error(AppError::rate_limited("Groq", "requests per minute exceeded"));
    provider.push_content("{\"workouts\": []}");

    let response = complete_with_retry(&provider, &request()).await.unwrap();
    assert_eq!(response.content, "{\"workouts\": []}");
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_tunneled_rate_limit_message_is_retried() {
    let provider = ScriptedProvider::new();
    provider.push_error(AppError::external_service(
        "Gateway",
        "upstream said Too Many Requests",
    ));
    provider.push_content("{}");

    complete_with_retry(&provider, &request()).await.unwrap();
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_surface_final_rate_limit_error() {
    let provider = ScriptedProvider::new();
    for _ in 0..limits::MAX_COMPLETION_ATTEMPTS {
        provider.push_error(AppError::rate_limited("Groq", "requests per minute exceeded"));
    }

    let err = complete_with_retry(&provider, &request()).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(provider.call_count(), limits::MAX_COMPLETION_ATTEMPTS as usize);
}

#[tokio::test(start_paused = true)]
async fn test_non_rate_limit_error_fails_on_first_attempt() {
    let provider = ScriptedProvider::new();
    provider.push_error(AppError::external_auth("Groq", "invalid API key"));
    provider.push_content("{}");

    let err = complete_with_retry(&provider, &request()).await.unwrap_err();
    assert!(!err.is_rate_limited());
    assert_eq!(provider.call_count(), 1);
}
