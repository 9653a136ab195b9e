// ABOUTME: Cooperative cancellation token re-reading the job record at checkpoints
// ABOUTME: A checkpoint persists the current phase and reports whether to stop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::JobStatus;
use crate::storage::JobStore;

/// Handle threaded through the pipeline for cooperative cancellation
///
/// Cancellation is observed only at checkpoints, placed before each model
/// call and before persisting results. A cancel landing mid-call takes
/// effect at the next checkpoint; whatever the in-flight call produced is
/// discarded, never persisted.
#[derive(Clone)]
pub struct CancellationToken {
    store: Arc<dyn JobStore>,
    job_id: Uuid,
}

impl CancellationToken {
    /// Create a token bound to one job record
    #[must_use]
    pub fn new(store: Arc<dyn JobStore>, job_id: Uuid) -> Self {
        Self { store, job_id }
    }

    /// The job this token observes
    #[must_use]
    pub const fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Re-read the job record and report whether it was cancelled
    ///
    /// A missing record counts as cancelled; there is nothing left to
    /// produce a result for.
    ///
    /// # Errors
    ///
    /// Propagates store read errors.
    pub async fn is_cancelled(&self) -> AppResult<bool> {
        let job = self.store.get(self.job_id).await?;
        Ok(job.map_or(true, |j| j.status == JobStatus::Cancelled))
    }

    /// Checkpoint: persist the upcoming phase and report cancellation
    ///
    /// Returns `true` when the run should stop. The phase label is only
    /// written when the job is still live, so a cancelled record keeps the
    /// step it was cancelled at.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn checkpoint(&self, step: &str) -> AppResult<bool> {
        if self.is_cancelled().await? {
            info!(job_id = %self.job_id, step, "cancellation observed at checkpoint");
            return Ok(true);
        }
        self.store
            .update_status(self.job_id, JobStatus::Processing, Some(step))
            .await?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, JobSubject};
    use crate::storage::memory::InMemoryStore;

    fn pending_job() -> Job {
        Job::new(JobSubject::Questionnaire {
            questionnaire_id: Uuid::new_v4(),
        })
    }

    #[tokio::test]
    async fn test_checkpoint_advances_step_while_live() {
        let store = Arc::new(InMemoryStore::new());
        let job = pending_job();
        store.create(&job).await.unwrap();

        let token = CancellationToken::new(store.clone(), job.id);
        assert!(!token.checkpoint("generating structure").await.unwrap());

        let stored = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Processing);
        assert_eq!(stored.current_step.as_deref(), Some("generating structure"));
    }

    #[tokio::test]
    async fn test_checkpoint_stops_after_cancel() {
        let store = Arc::new(InMemoryStore::new());
        let job = pending_job();
        store.create(&job).await.unwrap();
        store.mark_cancelled(job.id, None).await.unwrap();

        let token = CancellationToken::new(store.clone(), job.id);
        assert!(token.checkpoint("generating structure").await.unwrap());

        // The cancelled record keeps its state untouched.
        let stored = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Cancelled);
        assert!(stored.current_step.is_none());
    }

    #[tokio::test]
    async fn test_missing_job_counts_as_cancelled() {
        let store = Arc::new(InMemoryStore::new());
        let token = CancellationToken::new(store, Uuid::new_v4());
        assert!(token.is_cancelled().await.unwrap());
    }
}
