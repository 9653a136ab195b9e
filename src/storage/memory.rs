// ABOUTME: In-memory JobStore/PlanStore implementation backed by DashMap
// ABOUTME: Used by tests and demos; production binds the traits to a real database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use async_trait::async_trait;

use super::{JobStore, PlanStore};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ActualWorkout, BodyMetrics, Job, JobStatus, JobSubject, Questionnaire,
    RecommendationStructure, StoredRecommendation, Workout,
};

/// In-memory store implementing both storage contracts
///
/// Concurrency-safe via `DashMap`; the same non-atomic lookup-then-create
/// semantics as a real store, so dispatcher race behavior matches production.
#[derive(Default)]
pub struct InMemoryStore {
    jobs: DashMap<Uuid, Job>,
    questionnaires: DashMap<Uuid, Questionnaire>,
    body_metrics: DashMap<Uuid, BodyMetrics>,
    recommendations: DashMap<Uuid, StoredRecommendation>,
    workouts: DashMap<(Uuid, u32, u32), Workout>,
    actuals: DashMap<(Uuid, u32, u32), ActualWorkout>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a questionnaire for tests
    pub fn insert_questionnaire(&self, questionnaire: Questionnaire) {
        self.questionnaires
            .insert(questionnaire.id, questionnaire);
    }

    /// Seed body metrics for tests
    pub fn insert_body_metrics(&self, questionnaire_id: Uuid, metrics: BodyMetrics) {
        self.body_metrics.insert(questionnaire_id, metrics);
    }

    /// Seed a stored recommendation for tests
    pub fn insert_recommendation(&self, recommendation: StoredRecommendation) {
        self.recommendations
            .insert(recommendation.id, recommendation);
    }

    /// Seed or replace one workout for tests
    pub fn insert_workout(&self, recommendation_id: Uuid, workout: Workout) {
        self.workouts
            .insert((recommendation_id, workout.week, workout.session), workout);
    }

    /// Seed logged performance for tests
    pub fn insert_actual(&self, recommendation_id: Uuid, actual: ActualWorkout) {
        self.actuals
            .insert((recommendation_id, actual.week, actual.session), actual);
    }

    /// Direct job mutation for tests (e.g. aging `updated_at`)
    pub fn replace_job(&self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    fn job_mut<F>(&self, id: Uuid, mutate: F) -> AppResult<()>
    where
        F: FnOnce(&mut Job),
    {
        let mut entry = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id}")))?;
        mutate(entry.value_mut());
        entry.value_mut().updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn create(&self, job: &Job) -> AppResult<()> {
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Job>> {
        Ok(self.jobs.get(&id).map(|j| j.clone()))
    }

    async fn latest_for_subject(&self, subject: &JobSubject) -> AppResult<Option<Job>> {
        let key = subject.key();
        Ok(self
            .jobs
            .iter()
            .filter(|entry| entry.value().subject.key() == key)
            .max_by_key(|entry| entry.value().created_at)
            .map(|entry| entry.value().clone()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        current_step: Option<&str>,
    ) -> AppResult<()> {
        self.job_mut(id, |job| {
            job.status = status;
            if let Some(step) = current_step {
                job.current_step = Some(step.to_owned());
            }
            if status == JobStatus::Processing && job.started_at.is_none() {
                job.started_at = Some(Utc::now());
            }
        })
    }

    async fn mark_completed(&self, id: Uuid, result_id: Uuid) -> AppResult<()> {
        self.job_mut(id, |job| {
            job.status = JobStatus::Completed;
            job.result_id = Some(result_id);
            job.completed_at = Some(Utc::now());
        })
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> AppResult<()> {
        self.job_mut(id, |job| {
            job.status = JobStatus::Failed;
            job.error_message = Some(message.to_owned());
            job.completed_at = Some(Utc::now());
        })
    }

    async fn mark_cancelled(&self, id: Uuid, reason: Option<&str>) -> AppResult<()> {
        self.job_mut(id, |job| {
            job.status = JobStatus::Cancelled;
            if let Some(reason) = reason {
                job.error_message = Some(reason.to_owned());
            }
            job.completed_at = Some(Utc::now());
        })
    }
}

#[async_trait]
impl PlanStore for InMemoryStore {
    async fn get_questionnaire(&self, id: Uuid) -> AppResult<Option<Questionnaire>> {
        Ok(self.questionnaires.get(&id).map(|q| q.clone()))
    }

    async fn get_body_metrics(&self, questionnaire_id: Uuid) -> AppResult<Option<BodyMetrics>> {
        Ok(self.body_metrics.get(&questionnaire_id).map(|m| m.clone()))
    }

    async fn get_recommendation(&self, id: Uuid) -> AppResult<Option<StoredRecommendation>> {
        Ok(self.recommendations.get(&id).map(|r| r.clone()))
    }

    async fn workouts_for_week(
        &self,
        recommendation_id: Uuid,
        week: u32,
    ) -> AppResult<Vec<Workout>> {
        let mut workouts: Vec<Workout> = self
            .workouts
            .iter()
            .filter(|entry| {
                let (rec, w, _) = *entry.key();
                rec == recommendation_id && w == week
            })
            .map(|entry| entry.value().clone())
            .collect();
        workouts.sort_by_key(|w| w.session);
        Ok(workouts)
    }

    async fn actual_for_workout(
        &self,
        recommendation_id: Uuid,
        week: u32,
        session: u32,
    ) -> AppResult<Option<ActualWorkout>> {
        Ok(self
            .actuals
            .get(&(recommendation_id, week, session))
            .map(|a| a.clone()))
    }

    async fn save_recommendation(
        &self,
        questionnaire_id: Uuid,
        structure: &RecommendationStructure,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        self.recommendations.insert(
            id,
            StoredRecommendation {
                id,
                questionnaire_id,
                structure: structure.clone(),
            },
        );
        Ok(id)
    }

    async fn save_workouts(&self, recommendation_id: Uuid, workouts: &[Workout]) -> AppResult<()> {
        for workout in workouts {
            self.workouts.insert(
                (recommendation_id, workout.week, workout.session),
                workout.clone(),
            );
        }
        Ok(())
    }
}
