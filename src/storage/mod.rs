// ABOUTME: Async trait contracts for the external persistence collaborators
// ABOUTME: JobStore owns job lifecycle writes; PlanStore owns plan reads and result writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # Storage Contracts
//!
//! The core never owns durable storage. These traits describe the
//! collaborators it talks to: a job store for lifecycle bookkeeping and a
//! plan store for questionnaire/workout reads and validated result writes.
//! Production deployments bind them to a real database; tests and demos use
//! [`memory::InMemoryStore`].

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{
    ActualWorkout, BodyMetrics, Job, JobStatus, JobSubject, Questionnaire,
    RecommendationStructure, StoredRecommendation, Workout,
};

/// Persistence collaborator for job lifecycle state
///
/// Implementations must bump `updated_at` on every write; the stuck-job
/// heuristic depends on it.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a newly created job
    async fn create(&self, job: &Job) -> AppResult<()>;

    /// Load a job by id
    async fn get(&self, id: Uuid) -> AppResult<Option<Job>>;

    /// Most recently created job for a subject, regardless of status
    async fn latest_for_subject(&self, subject: &JobSubject) -> AppResult<Option<Job>>;

    /// Update status and optionally the human-readable phase
    ///
    /// Sets `started_at` on the first transition to `Processing`.
    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        current_step: Option<&str>,
    ) -> AppResult<()>;

    /// Mark the job completed with its result reference
    async fn mark_completed(&self, id: Uuid, result_id: Uuid) -> AppResult<()>;

    /// Mark the job failed with a captured error message
    async fn mark_failed(&self, id: Uuid, message: &str) -> AppResult<()>;

    /// Mark the job cancelled, optionally recording the reason
    async fn mark_cancelled(&self, id: Uuid, reason: Option<&str>) -> AppResult<()>;
}

/// Persistence collaborator for plan inputs and validated results
///
/// Reads are side-effect free from the core's perspective.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Load a questionnaire by id
    async fn get_questionnaire(&self, id: Uuid) -> AppResult<Option<Questionnaire>>;

    /// Body-composition metrics attached to a questionnaire, if any
    async fn get_body_metrics(&self, questionnaire_id: Uuid) -> AppResult<Option<BodyMetrics>>;

    /// Load a stored recommendation by id
    async fn get_recommendation(&self, id: Uuid) -> AppResult<Option<StoredRecommendation>>;

    /// All workouts of one week of a recommendation, ordered by session
    async fn workouts_for_week(
        &self,
        recommendation_id: Uuid,
        week: u32,
    ) -> AppResult<Vec<Workout>>;

    /// Logged performance for one workout, if any
    async fn actual_for_workout(
        &self,
        recommendation_id: Uuid,
        week: u32,
        session: u32,
    ) -> AppResult<Option<ActualWorkout>>;

    /// Persist a validated recommendation structure, returning its id
    async fn save_recommendation(
        &self,
        questionnaire_id: Uuid,
        structure: &RecommendationStructure,
    ) -> AppResult<Uuid>;

    /// Persist validated workouts for a recommendation
    async fn save_workouts(&self, recommendation_id: Uuid, workouts: &[Workout]) -> AppResult<()>;
}
