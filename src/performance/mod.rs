// ABOUTME: Aggregates proposed-vs-actual workout data from completed prior weeks
// ABOUTME: Renders a compact history narrative used as progressive-generation context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # Performance Aggregator
//!
//! Progressive weeks are generated against what actually happened, not what
//! was prescribed. This module pairs each prior week's workouts with their
//! logged actuals and renders the pairs as a narrative the workout prompt
//! embeds verbatim. Weeks with nothing logged are skipped rather than padded
//! with empty sections.

use std::fmt::Write as _;

use tracing::debug;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{ExercisePerformance, PerformanceSnapshot, SessionOutcome, Workout};
use crate::storage::PlanStore;

/// Collect per-week snapshots for every week strictly before `target_week`
///
/// # Errors
///
/// Propagates store read errors.
pub async fn collect_snapshots(
    store: &dyn PlanStore,
    recommendation_id: Uuid,
    target_week: u32,
) -> AppResult<Vec<PerformanceSnapshot>> {
    let mut snapshots = Vec::new();

    for week in 1..target_week {
        let workouts = store.workouts_for_week(recommendation_id, week).await?;
        if workouts.is_empty() {
            continue;
        }

        let mut sessions = Vec::with_capacity(workouts.len());
        for planned in workouts {
            let actual = store
                .actual_for_workout(recommendation_id, week, planned.session)
                .await?;
            sessions.push(SessionOutcome { planned, actual });
        }

        snapshots.push(PerformanceSnapshot { week, sessions });
    }

    debug!(
        recommendation_id = %recommendation_id,
        weeks = snapshots.len(),
        "collected performance history"
    );

    Ok(snapshots)
}

/// Render snapshots as the narrative block embedded in progressive prompts
///
/// Every exercise whose logged sets were all at RIR 0 gets an explicit
/// do-not-increase-load constraint so the model cannot progress a movement
/// the client already failed on.
#[must_use]
pub fn build_history_narrative(snapshots: &[PerformanceSnapshot]) -> String {
    let mut out = String::new();

    for snapshot in snapshots {
        let _ = writeln!(out, "Week {} performance:", snapshot.week);

        for outcome in &snapshot.sessions {
            write_session(&mut out, outcome);
        }
        out.push('\n');
    }

    out.trim_end().to_owned()
}

fn write_session(out: &mut String, outcome: &SessionOutcome) {
    let planned = &outcome.planned;
    let _ = writeln!(
        out,
        "  Session {} - {} ({:?})",
        planned.session, planned.name, planned.state
    );

    let Some(actual) = &outcome.actual else {
        let _ = writeln!(out, "    No performance logged.");
        return;
    };

    for prescription in &planned.exercises {
        let _ = write!(
            out,
            "    {}: prescribed {}x{} @ {}",
            prescription.name, prescription.sets, prescription.reps, prescription.load
        );

        match actual
            .exercises
            .iter()
            .find(|perf| perf.exercise == prescription.name)
        {
            Some(perf) => {
                let _ = writeln!(
                    out,
                    "; actual reps {} @ {}, RIR {}",
                    join_counts(&perf.actual_reps),
                    perf.actual_load,
                    join_counts(&perf.rir)
                );
                if let Some(notes) = &perf.notes {
                    let _ = writeln!(out, "      notes: {notes}");
                }
                if perf.at_failure() {
                    let _ = writeln!(
                        out,
                        "      CONSTRAINT: every set of {} was taken to failure (RIR 0). \
                         Do not increase its prescribed load next week.",
                        perf.exercise
                    );
                }
            }
            None => {
                let _ = writeln!(out, "; not logged");
            }
        }
    }

    if let Some(rir) = actual.session_rir {
        let _ = writeln!(out, "    Session RIR: {rir}");
    }
    if let Some(energy) = actual.energy_level {
        let _ = writeln!(out, "    Energy level: {energy}/10");
    }
    if let Some(observations) = &actual.trainer_observations {
        let _ = writeln!(out, "    Trainer observations: {observations}");
    }
}

fn join_counts(values: &[u32]) -> String {
    if values.is_empty() {
        return "-".to_owned();
    }
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether any exercise across the snapshots was taken to failure every set
#[must_use]
pub fn has_failed_exercises(snapshots: &[PerformanceSnapshot]) -> bool {
    snapshots.iter().any(|snapshot| {
        snapshot.sessions.iter().any(|outcome| {
            outcome
                .actual
                .as_ref()
                .is_some_and(|actual| actual.exercises.iter().any(ExercisePerformance::at_failure))
        })
    })
}

/// Sessions of a week are all in a terminal per-workout state
///
/// Gate for progressive generation: week N+1 may only be requested once every
/// workout of week N is completed, skipped, or cancelled. An empty week is
/// not eligible.
#[must_use]
pub fn week_is_terminal(workouts: &[Workout]) -> bool {
    !workouts.is_empty() && workouts.iter().all(|w| w.state.is_terminal())
}
