// ABOUTME: Core domain models for jobs, recommendations, workouts, and logged performance
// ABOUTME: Serde-friendly types shared by the pipeline, dispatcher, and storage traits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # Domain Models
//!
//! Data structures for the plan-generation core. Model-produced types
//! (`RecommendationStructure`, `Workout`) are deserialized from repaired LLM
//! output, so optional fields default rather than fail; mandatory-field
//! enforcement lives in [`crate::generation::validation`], not in serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Jobs
// ============================================================================

/// Lifecycle state of a generation job
///
/// Transitions are forward-only (`pending → processing → completed|failed`)
/// except user-triggered cancellation from `pending` or `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not yet picked up
    Pending,
    /// A worker is running the pipeline
    Processing,
    /// Finished successfully; result reference is set
    Completed,
    /// Finished with a captured error message
    Failed,
    /// Cancelled by the user before completion
    Cancelled,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions)
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// String representation used by external stores
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a job generates for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobSubject {
    /// Initial plan generation from a questionnaire
    Questionnaire {
        /// Questionnaire to generate the initial plan from
        questionnaire_id: Uuid,
    },
    /// Progressive generation of one additional week for an existing plan
    ProgressiveWeek {
        /// Recommendation the new week extends
        recommendation_id: Uuid,
        /// Target week number (>= 2)
        week: u32,
    },
}

impl JobSubject {
    /// Stable lookup key used for the one-active-job-per-subject check
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Questionnaire { questionnaire_id } => {
                format!("questionnaire:{questionnaire_id}")
            }
            Self::ProgressiveWeek {
                recommendation_id,
                week,
            } => format!("recommendation:{recommendation_id}:week:{week}"),
        }
    }
}

/// Persisted unit of asynchronous generation work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job identity
    pub id: Uuid,
    /// What this job generates for
    pub subject: JobSubject,
    /// Lifecycle state
    pub status: JobStatus,
    /// Human-readable phase for polling consumers
    pub current_step: Option<String>,
    /// Captured error message when `status == Failed`
    pub error_message: Option<String>,
    /// Reference to the stored result when `status == Completed`
    pub result_id: Option<Uuid>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time processing first started
    pub started_at: Option<DateTime<Utc>>,
    /// Time a terminal status was reached
    pub completed_at: Option<DateTime<Utc>>,
    /// Last write to this record, drives the stuck-job heuristic
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job for the given subject
    #[must_use]
    pub fn new(subject: JobSubject) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject,
            status: JobStatus::Pending,
            current_step: None,
            error_message: None,
            result_id: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }
}

// ============================================================================
// Stage 1 output: recommendation structure
// ============================================================================

/// Plan skeleton produced by the structure stage
///
/// The nested shape is model-authored and passed back verbatim as stage-2
/// context, so it stays a raw JSON value rather than a rigid struct.
pub type PlanStructure = serde_json::Value;

/// Output of the structure stage: persona, cadence, and plan skeleton
///
/// Produced once by stage 1 and immutable input to every later stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationStructure {
    /// Persona label (e.g. "The Rebuilder")
    #[serde(default)]
    pub client_type: String,
    /// Training sessions per week; drives stage-2 output cardinality
    #[serde(default)]
    pub sessions_per_week: u32,
    /// Target session length in minutes
    #[serde(default)]
    pub session_length_minutes: u32,
    /// Free-text training style description
    #[serde(default)]
    pub training_style: String,
    /// Nested plan skeleton (weeks, methods, weekly narrative, progression)
    #[serde(default)]
    pub plan_structure: PlanStructure,
    /// Model reasoning text
    #[serde(default)]
    pub reasoning: String,
}

/// A recommendation as persisted by the external store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecommendation {
    /// Store-assigned identity
    pub id: Uuid,
    /// Questionnaire the plan was generated from
    pub questionnaire_id: Uuid,
    /// The validated structure
    pub structure: RecommendationStructure,
}

// ============================================================================
// Workouts
// ============================================================================

/// Per-workout lifecycle state logged by the training floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutState {
    /// Prescribed but not yet performed
    #[default]
    Planned,
    /// Performed and logged
    Completed,
    /// Deliberately skipped
    Skipped,
    /// Cancelled (e.g. injury, plan change)
    Cancelled,
}

impl WorkoutState {
    /// Terminal states make a week eligible for progressive generation
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped | Self::Cancelled)
    }
}

/// One prescribed exercise within a workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisePrescription {
    /// Exercise name
    pub name: String,
    /// Number of working sets
    #[serde(default)]
    pub sets: u32,
    /// Rep prescription, often a range ("8-10")
    #[serde(default)]
    pub reps: String,
    /// Load prescription ("60kg", "BW+10kg", "RPE 8")
    #[serde(default)]
    pub load: String,
    /// Rest between sets
    #[serde(default)]
    pub rest: Option<String>,
    /// Coaching notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// One generated training session
///
/// Unique per (recommendation, week, session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Week this workout belongs to (1-based)
    #[serde(default)]
    pub week: u32,
    /// Session number within the week (1-based)
    #[serde(default)]
    pub session: u32,
    /// Session name ("Lower Body A")
    #[serde(default)]
    pub name: String,
    /// Structured exercise prescriptions
    #[serde(default)]
    pub exercises: Vec<ExercisePrescription>,
    /// Model reasoning text
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Logged lifecycle state; always `Planned` on generation
    #[serde(default)]
    pub state: WorkoutState,
}

// ============================================================================
// Logged performance
// ============================================================================

/// Logged actuals for one exercise of a performed workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisePerformance {
    /// Exercise name, matches the prescription
    pub exercise: String,
    /// Actual reps per set
    #[serde(default)]
    pub actual_reps: Vec<u32>,
    /// Actual load used
    #[serde(default)]
    pub actual_load: String,
    /// Reps-in-reserve per set; 0 means the set was taken to failure
    #[serde(default)]
    pub rir: Vec<u32>,
    /// Exercise-level notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl ExercisePerformance {
    /// Whether every logged set was taken to failure (RIR 0)
    #[must_use]
    pub fn at_failure(&self) -> bool {
        !self.rir.is_empty() && self.rir.iter().all(|&r| r == 0)
    }
}

/// Logged performance for one workout; at most one per [`Workout`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualWorkout {
    /// Week of the workout this logs
    pub week: u32,
    /// Session number of the workout this logs
    pub session: u32,
    /// Per-exercise actuals
    #[serde(default)]
    pub exercises: Vec<ExercisePerformance>,
    /// Whole-session reps-in-reserve estimate
    #[serde(default)]
    pub session_rir: Option<u32>,
    /// Subjective energy level (1-10)
    #[serde(default)]
    pub energy_level: Option<u32>,
    /// Trainer observations
    #[serde(default)]
    pub trainer_observations: Option<String>,
}

/// Proposed-vs-actual pairing for one session of a prior week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// What was prescribed
    pub planned: Workout,
    /// What was logged, if anything
    pub actual: Option<ActualWorkout>,
}

/// Derived per-week pairing used to build progressive prompt context
///
/// Never persisted; built on demand by the performance aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Week the snapshot covers
    pub week: u32,
    /// Outcomes for every session of that week
    pub sessions: Vec<SessionOutcome>,
}

// ============================================================================
// Generation inputs
// ============================================================================

/// Client questionnaire answers consumed by the structure stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Questionnaire {
    /// Questionnaire identity
    pub id: Uuid,
    /// Stated training goals
    pub goals: String,
    /// Training experience description
    pub experience_level: String,
    /// Scheduling constraints ("mornings only, 3 days/week")
    pub schedule_constraints: String,
    /// Psychometric scores keyed by trait name
    #[serde(default)]
    pub psychometric_scores: BTreeMap<String, f64>,
    /// Client age, if provided
    #[serde(default)]
    pub age: Option<u32>,
    /// Free-form intake notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Optional body-composition metrics attached to a questionnaire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodyMetrics {
    /// Body weight in kilograms
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Body fat percentage
    #[serde(default)]
    pub body_fat_percent: Option<f64>,
    /// Skeletal muscle mass in kilograms
    #[serde(default)]
    pub muscle_mass_kg: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminality() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_subject_keys_distinguish_weeks() {
        let rec = Uuid::new_v4();
        let week2 = JobSubject::ProgressiveWeek {
            recommendation_id: rec,
            week: 2,
        };
        let week3 = JobSubject::ProgressiveWeek {
            recommendation_id: rec,
            week: 3,
        };
        assert_ne!(week2.key(), week3.key());
    }

    #[test]
    fn test_exercise_at_failure() {
        let perf = ExercisePerformance {
            exercise: "Back Squat".into(),
            actual_reps: vec![8, 7, 6],
            actual_load: "80kg".into(),
            rir: vec![0, 0, 0],
            notes: None,
        };
        assert!(perf.at_failure());

        let perf_ok = ExercisePerformance {
            rir: vec![2, 1, 0],
            ..perf.clone()
        };
        assert!(!perf_ok.at_failure());

        let perf_unlogged = ExercisePerformance {
            rir: vec![],
            ..perf
        };
        assert!(!perf_unlogged.at_failure());
    }

    #[test]
    fn test_workout_deserializes_with_defaults() {
        let workout: Workout = serde_json::from_value(serde_json::json!({
            "week": 1,
            "session": 2,
            "name": "Upper Body A"
        }))
        .unwrap();
        assert_eq!(workout.week, 1);
        assert!(workout.exercises.is_empty());
        assert_eq!(workout.state, WorkoutState::Planned);
    }
}
