// ABOUTME: Job dispatcher: idempotent enqueue, worker-side run, user-facing cancel
// ABOUTME: Owns job bookkeeping and delegates the actual work to PlanGenerator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{should_skip, CancellationToken};
use crate::constants::steps;
use crate::errors::{AppError, AppResult};
use crate::generation::{GenerationOutcome, PlanGenerator};
use crate::llm::LlmProvider;
use crate::models::{Job, JobStatus, JobSubject};
use crate::performance::week_is_terminal;
use crate::storage::{JobStore, PlanStore};

/// Entry point for the job lifecycle
///
/// `enqueue` and `cancel` are the caller-facing surface; `run` is invoked by
/// whatever worker mechanism delivers jobs (queue consumer, cron sweep).
pub struct JobDispatcher {
    jobs: Arc<dyn JobStore>,
    plans: Arc<dyn PlanStore>,
    provider: Arc<dyn LlmProvider>,
}

impl JobDispatcher {
    /// Create a dispatcher over the given collaborators
    #[must_use]
    pub fn new(
        jobs: Arc<dyn JobStore>,
        plans: Arc<dyn PlanStore>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            jobs,
            plans,
            provider,
        }
    }

    /// Enqueue a generation job, idempotent per subject
    ///
    /// If a non-terminal job already exists for the subject it is returned
    /// unchanged instead of creating a duplicate. The lookup-then-create is
    /// not atomic; two racing callers can still both create a job, which the
    /// stuck-window check in [`Self::run`] then de-duplicates.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown questionnaire or recommendation,
    /// `InvalidInput` for a progressive week below 2, and `ResourceLocked`
    /// when the prior week still has unfinished workouts.
    #[instrument(skip(self))]
    pub async fn enqueue(&self, subject: JobSubject) -> AppResult<Job> {
        self.validate_subject(&subject).await?;

        if let Some(existing) = self.jobs.latest_for_subject(&subject).await? {
            if !existing.status.is_terminal() {
                info!(
                    job_id = %existing.id,
                    status = %existing.status,
                    "returning existing active job for subject"
                );
                return Ok(existing);
            }
        }

        let mut job = Job::new(subject);
        job.current_step = Some(steps::STARTING.to_owned());
        self.jobs.create(&job).await?;
        info!(job_id = %job.id, "enqueued generation job");
        Ok(job)
    }

    /// Execute one job; worker-side, safe under at-least-once delivery
    ///
    /// Terminal jobs and active duplicates are skipped. Pipeline failures
    /// are captured on the job record as `failed`; only store errors while
    /// doing that bookkeeping propagate to the caller.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown job id, plus store errors.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run(&self, job_id: Uuid) -> AppResult<()> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job {job_id}")))?;

        if should_skip(&job, Utc::now()) {
            info!(status = %job.status, "skipping job");
            return Ok(());
        }

        let token = CancellationToken::new(self.jobs.clone(), job.id);
        if token.checkpoint(steps::STARTING).await? {
            return Ok(());
        }

        let generator = PlanGenerator::new(self.plans.clone(), self.provider.clone());
        let outcome = match &job.subject {
            JobSubject::Questionnaire { questionnaire_id } => {
                generator.generate_initial(*questionnaire_id, &token).await
            }
            JobSubject::ProgressiveWeek {
                recommendation_id,
                week,
            } => {
                generator
                    .generate_progressive(*recommendation_id, *week, &token)
                    .await
            }
        };

        match outcome {
            Ok(GenerationOutcome::Completed(result)) => {
                self.jobs.mark_completed(job.id, result.result_id()).await?;
                info!(result_id = %result.result_id(), "job completed");
            }
            Ok(GenerationOutcome::Cancelled) => {
                info!("job run stopped at a cancellation checkpoint");
            }
            Err(e) => {
                error!(error = %e, "job failed");
                self.jobs.mark_failed(job.id, &e.to_string()).await?;
            }
        }

        Ok(())
    }

    /// Cancel a job on behalf of the user
    ///
    /// Cancelling an already-cancelled job is a no-op; cancelling a finished
    /// one is rejected. A `processing` job is marked immediately and the
    /// running pipeline stops at its next checkpoint.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown job id, `ResourceLocked` when the
    /// job already completed or failed.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn cancel(&self, job_id: Uuid, reason: Option<&str>) -> AppResult<()> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job {job_id}")))?;

        match job.status {
            JobStatus::Cancelled => Ok(()),
            JobStatus::Completed | JobStatus::Failed => Err(AppError::locked(format!(
                "job {job_id} already finished as {}",
                job.status
            ))),
            JobStatus::Pending | JobStatus::Processing => {
                self.jobs.mark_cancelled(job_id, reason).await?;
                info!("job cancelled");
                Ok(())
            }
        }
    }

    /// Subject preconditions checked before any job record is written
    async fn validate_subject(&self, subject: &JobSubject) -> AppResult<()> {
        match subject {
            JobSubject::Questionnaire { questionnaire_id } => {
                self.plans
                    .get_questionnaire(*questionnaire_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Questionnaire {questionnaire_id}"))
                    })?;
                Ok(())
            }
            JobSubject::ProgressiveWeek {
                recommendation_id,
                week,
            } => {
                if *week < 2 {
                    return Err(AppError::invalid_input(
                        "progressive generation starts at week 2; week 1 comes from the initial plan",
                    ));
                }
                self.plans
                    .get_recommendation(*recommendation_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Recommendation {recommendation_id}"))
                    })?;

                let prior = self
                    .plans
                    .workouts_for_week(*recommendation_id, week - 1)
                    .await?;
                if !week_is_terminal(&prior) {
                    return Err(AppError::locked(format!(
                        "week {} still has unfinished workouts",
                        week - 1
                    )));
                }
                Ok(())
            }
        }
    }
}
