// ABOUTME: Main library entry point for the Plansmith plan-generation core
// ABOUTME: Exposes jobs, generation pipeline, extraction, and storage contracts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

#![deny(unsafe_code)]

//! # Plansmith
//!
//! Core engine for generating multi-week personalized training plans by
//! orchestrating calls to a text-generation model. Generation runs as a
//! cancellable background job, survives malformed model output, and adapts
//! later weeks to logged real-world performance.
//!
//! ## Architecture
//!
//! - **jobs**: async job state machine (enqueue / run / cancel) with
//!   idempotent enqueue and cooperative cancellation
//! - **generation**: two-stage pipeline (plan structure, then concrete
//!   workouts) plus prompt builders and post-parse validation
//! - **extraction**: resilient JSON extraction and repair for raw model text
//! - **performance**: proposed-vs-actual aggregation feeding progressive
//!   weeks
//! - **llm**: provider trait and `OpenAI`-compatible implementation with
//!   rate-limit-only retry
//! - **storage**: trait contracts for the external persistence collaborators
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use plansmith::jobs::JobDispatcher;
//! use plansmith::llm::provider_from_env;
//! use plansmith::models::JobSubject;
//! use plansmith::storage::memory::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     plansmith::logging::init()?;
//!
//!     let store = Arc::new(InMemoryStore::new());
//!     let provider = Arc::new(provider_from_env()?);
//!     let dispatcher = JobDispatcher::new(store.clone(), store, provider);
//!
//!     let job = dispatcher
//!         .enqueue(JobSubject::Questionnaire {
//!             questionnaire_id: uuid::Uuid::new_v4(),
//!         })
//!         .await?;
//!     dispatcher.run(job.id).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod extraction;
pub mod generation;
pub mod jobs;
pub mod llm;
pub mod logging;
pub mod models;
pub mod performance;
pub mod storage;
