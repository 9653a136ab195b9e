// ABOUTME: Prompt builders for the structure, workout, and progression model calls
// ABOUTME: Every prompt instructs a single-JSON-object reply and enumerates required keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

use std::fmt::Write as _;

use crate::llm::ChatMessage;
use crate::models::{BodyMetrics, Questionnaire, RecommendationStructure};

const STRUCTURE_SYSTEM_PROMPT: &str = "\
You are an expert strength and conditioning coach designing a multi-week \
personalized training plan. Respond with exactly one JSON object and no \
surrounding prose or markdown. The object must contain these keys: \
\"client_type\" (string persona label), \"sessions_per_week\" (integer), \
\"session_length_minutes\" (integer), \"training_style\" (string), \
\"plan_structure\" (object with weeks, training methods, a weekly narrative, \
and a progression strategy), and \"reasoning\" (string).";

const WORKOUT_SYSTEM_PROMPT: &str = "\
You are an expert strength and conditioning coach writing out individual \
training sessions. Respond with exactly one JSON object and no surrounding \
prose or markdown. The object must contain a \"workouts\" array; each entry \
must contain \"week\" (integer), \"session\" (integer), \"name\" (string), \
\"exercises\" (array of objects with \"name\", \"sets\", \"reps\", \"load\", \
and optional \"rest\" and \"notes\"), and optional \"reasoning\" (string).";

/// Build the stage-1 structure prompt from questionnaire answers
#[must_use]
pub fn structure_prompt(
    questionnaire: &Questionnaire,
    metrics: Option<&BodyMetrics>,
) -> Vec<ChatMessage> {
    let mut user = String::new();

    let _ = writeln!(user, "Design a training plan for this client.");
    let _ = writeln!(user, "Goals: {}", questionnaire.goals);
    let _ = writeln!(user, "Experience: {}", questionnaire.experience_level);
    let _ = writeln!(
        user,
        "Schedule constraints: {}",
        questionnaire.schedule_constraints
    );
    if let Some(age) = questionnaire.age {
        let _ = writeln!(user, "Age: {age}");
    }
    if !questionnaire.psychometric_scores.is_empty() {
        let _ = writeln!(user, "Psychometric profile:");
        for (trait_name, score) in &questionnaire.psychometric_scores {
            let _ = writeln!(user, "  {trait_name}: {score:.1}");
        }
    }
    if let Some(notes) = &questionnaire.notes {
        let _ = writeln!(user, "Intake notes: {notes}");
    }
    if let Some(metrics) = metrics {
        write_metrics(&mut user, metrics);
    }

    vec![
        ChatMessage::system(STRUCTURE_SYSTEM_PROMPT),
        ChatMessage::user(user),
    ]
}

/// Build the stage-2 or progressive workout prompt
///
/// Carries the stage-1 structure plus the same client context the structure
/// stage saw. With `history` present this is a progressive call: the
/// narrative is embedded verbatim and the model is told to honor its
/// constraints and to preserve the plan's periodization scheme.
#[must_use]
pub fn workout_prompt(
    structure: &RecommendationStructure,
    week: u32,
    client: Option<&Questionnaire>,
    metrics: Option<&BodyMetrics>,
    history: Option<&str>,
) -> Vec<ChatMessage> {
    let mut user = String::new();

    let _ = writeln!(
        user,
        "Write out all {} training sessions for week {week} of this plan. \
         Tag every workout with \"week\": {week}.",
        structure.sessions_per_week
    );
    let _ = writeln!(user, "Client type: {}", structure.client_type);
    let _ = writeln!(user, "Training style: {}", structure.training_style);
    let _ = writeln!(
        user,
        "Session length: {} minutes",
        structure.session_length_minutes
    );
    let _ = writeln!(
        user,
        "Plan structure:\n{}",
        serde_json::to_string_pretty(&structure.plan_structure)
            .unwrap_or_else(|_| structure.plan_structure.to_string())
    );

    if let Some(client) = client {
        let _ = writeln!(user, "Goals: {}", client.goals);
        let _ = writeln!(user, "Experience: {}", client.experience_level);
        let _ = writeln!(user, "Schedule constraints: {}", client.schedule_constraints);
        if let Some(age) = client.age {
            let _ = writeln!(user, "Age: {age}");
        }
    }
    if let Some(metrics) = metrics {
        write_metrics(&mut user, metrics);
    }

    if let Some(history) = history {
        let _ = writeln!(
            user,
            "\nLogged performance from prior weeks:\n{history}\n\n\
             Adjust loads and volume based on this history and obey every \
             CONSTRAINT line exactly. Preserve the plan's periodization \
             scheme; progress within it rather than redesigning it."
        );
    }

    vec![
        ChatMessage::system(WORKOUT_SYSTEM_PROMPT),
        ChatMessage::user(user),
    ]
}

fn write_metrics(out: &mut String, metrics: &BodyMetrics) {
    if let Some(weight) = metrics.weight_kg {
        let _ = writeln!(out, "Body weight: {weight:.1} kg");
    }
    if let Some(body_fat) = metrics.body_fat_percent {
        let _ = writeln!(out, "Body fat: {body_fat:.1}%");
    }
    if let Some(muscle) = metrics.muscle_mass_kg {
        let _ = writeln!(out, "Muscle mass: {muscle:.1} kg");
    }
}
