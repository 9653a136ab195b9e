// ABOUTME: Background job state machine: enqueue, run, cancel, duplicate suppression
// ABOUTME: Pure should_skip decision plus the dispatcher and cancellation token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # Generation Jobs
//!
//! Generation runs for minutes, so callers enqueue a job and poll its record
//! instead of holding a request open. The state machine is forward-only:
//! `pending → processing → completed | failed`, with user-triggered
//! cancellation allowed from the two live states.
//!
//! Invocation is at-least-once. A worker picking up a job first consults
//! [`should_skip`]: terminal jobs are no-ops, a `processing` job touched
//! within the stuck window is an active duplicate, and one untouched for
//! longer is presumed abandoned and restarted from scratch. No partial
//! progress is resumed; the pipeline persists nothing until validation
//! passes, so a restart repeats all model calls.

pub mod cancellation;
pub mod dispatcher;

pub use cancellation::CancellationToken;
pub use dispatcher::JobDispatcher;

use chrono::{DateTime, Utc};

use crate::config;
use crate::models::{Job, JobStatus};

/// Decide whether a worker invocation should skip this job
///
/// Pure decision over the job record and the current time; the stuck window
/// comes from [`config::job_stuck_secs`]. Returns `true` for terminal jobs
/// and for `processing` jobs still inside the window.
#[must_use]
pub fn should_skip(job: &Job, now: DateTime<Utc>) -> bool {
    if job.status.is_terminal() {
        return true;
    }
    if job.status == JobStatus::Processing {
        let age_secs = now.signed_duration_since(job.updated_at).num_seconds();
        return age_secs < config::job_stuck_secs();
    }
    false
}
