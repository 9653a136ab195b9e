// ABOUTME: Post-parse validation of model-produced structures and workout lists
// ABOUTME: Mandatory scalars are hard failures; count mismatches are warnings only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

use serde_json::Value;
use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::models::{RecommendationStructure, Workout, WorkoutState};

/// Validate the mandatory fields of a stage-1 structure
///
/// The persona label and both cadence numbers are load-bearing: stage 2 keys
/// its output cardinality off `sessions_per_week`, so a structure missing them
/// cannot drive the rest of the pipeline.
///
/// # Errors
///
/// `MissingRequiredField` for an absent persona, `InvalidInput` for a cadence
/// outside the plausible range.
pub fn validate_structure(structure: &RecommendationStructure) -> AppResult<()> {
    if structure.client_type.trim().is_empty() {
        return Err(AppError::missing_field("client_type"));
    }
    if structure.sessions_per_week == 0 || structure.sessions_per_week > 14 {
        return Err(AppError::invalid_input(format!(
            "sessions_per_week out of range: {}",
            structure.sessions_per_week
        )));
    }
    if structure.session_length_minutes == 0 {
        return Err(AppError::invalid_input(
            "session_length_minutes must be positive",
        ));
    }
    Ok(())
}

/// Deserialize and filter a workout list from extracted model output
///
/// Accepts either `{"workouts": [...]}` or a bare top-level array. Items are
/// deserialized independently so one malformed entry does not discard the
/// rest. Entries tagged with a different week are dropped with a warning; a
/// count differing from `expected` is logged but not fatal. All returned
/// workouts are forced to the `Planned` state.
///
/// # Errors
///
/// `MissingRequiredField` when no workout array is present,
/// `InvalidFormat` when filtering leaves no usable workout.
pub fn workouts_from_value(value: &Value, week: u32, expected: u32) -> AppResult<Vec<Workout>> {
    let items = value
        .get("workouts")
        .and_then(Value::as_array)
        .or_else(|| value.as_array())
        .ok_or_else(|| AppError::missing_field("workouts"))?;

    let mut workouts = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<Workout>(item.clone()) {
            Ok(mut workout) => {
                if workout.week != week {
                    warn!(
                        index,
                        found_week = workout.week,
                        requested_week = week,
                        "dropping workout tagged with a different week"
                    );
                    continue;
                }
                workout.state = WorkoutState::Planned;
                workouts.push(workout);
            }
            Err(e) => {
                warn!(index, error = %e, "skipping undeserializable workout entry");
            }
        }
    }

    if workouts.is_empty() {
        return Err(AppError::invalid_format(format!(
            "model produced no usable workouts for week {week}"
        )));
    }

    let count =
        u32::try_from(workouts.len()).map_err(|_| AppError::internal("workout count overflow"))?;
    if count != expected {
        warn!(
            week,
            expected,
            actual = count,
            "workout count differs from sessions_per_week"
        );
    }

    workouts.sort_by_key(|w| w.session);
    Ok(workouts)
}
