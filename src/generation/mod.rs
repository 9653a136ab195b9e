// ABOUTME: Two-stage generation pipeline: structure first, then concrete workouts
// ABOUTME: Prompt builders, post-parse validation, and the PlanGenerator orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # Plan Generation Pipeline
//!
//! Plans are produced in two model calls. Stage 1 turns questionnaire answers
//! into a [`RecommendationStructure`]: persona, weekly cadence, and a plan
//! skeleton. Stage 2 writes out the concrete week-1 workouts against that
//! structure. Progressive weeks rerun stage 2 with a performance-history
//! narrative appended, so loads adapt to what the client actually did.
//!
//! Both stages run their raw output through [`crate::extraction`] and the
//! validation layer before anything is persisted. A run that is cancelled at
//! a checkpoint yields [`GenerationOutcome::Cancelled`] rather than an error;
//! cancellation is an expected outcome, not a failure.

pub mod pipeline;
pub mod prompts;
pub mod validation;

pub use pipeline::PlanGenerator;

use uuid::Uuid;

use crate::models::{RecommendationStructure, Workout};

/// Validated, persisted output of a completed run
#[derive(Debug, Clone)]
pub enum GenerationResult {
    /// Stage 1 + 2 output for a fresh questionnaire
    InitialPlan {
        /// Store-assigned id of the saved recommendation
        recommendation_id: Uuid,
        /// The validated structure
        structure: RecommendationStructure,
        /// Week-1 workouts, sorted by session
        workouts: Vec<Workout>,
    },
    /// One additional week for an existing recommendation
    ProgressiveWeek {
        /// Recommendation the week extends
        recommendation_id: Uuid,
        /// The generated week number
        week: u32,
        /// Workouts for that week, sorted by session
        workouts: Vec<Workout>,
    },
}

impl GenerationResult {
    /// The stored-result reference recorded on the completed job
    #[must_use]
    pub const fn result_id(&self) -> Uuid {
        match self {
            Self::InitialPlan {
                recommendation_id, ..
            }
            | Self::ProgressiveWeek {
                recommendation_id, ..
            } => *recommendation_id,
        }
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// The run finished and its results were persisted
    Completed(GenerationResult),
    /// A cancellation was observed at a checkpoint; nothing was persisted
    /// past the last completed phase
    Cancelled,
}
