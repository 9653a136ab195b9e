// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Scripted LLM provider plus seed-data helpers for the in-memory store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use plansmith::errors::AppError;
use plansmith::llm::{ChatRequest, ChatResponse, LlmProvider};
use plansmith::models::{
    ActualWorkout, ExercisePerformance, ExercisePrescription, Questionnaire,
    RecommendationStructure, StoredRecommendation, Workout, WorkoutState,
};
use plansmith::storage::memory::InMemoryStore;

/// Provider that replays scripted responses and records every request
///
/// Responses pop in FIFO order; running out of script is a test bug surfaced
/// as an external-service error.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ChatResponse, AppError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response with the given content
    pub fn push_content(&self, content: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(ChatResponse {
            content: content.into(),
            model: "test-model".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        }));
    }

    /// Queue an error response
    pub fn push_error(&self, error: AppError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Requests the pipeline has issued so far
    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted Test Provider"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(AppError::external_service(
                    "scripted",
                    "no scripted response left",
                ))
            })
    }
}

/// Seed a questionnaire and return its id
pub fn seed_questionnaire(store: &InMemoryStore) -> Uuid {
    let id = Uuid::new_v4();
    store.insert_questionnaire(Questionnaire {
        id,
        goals: "rebuild strength after a six-month layoff".to_owned(),
        experience_level: "previously intermediate".to_owned(),
        schedule_constraints: "3 evenings per week, 60 minutes".to_owned(),
        psychometric_scores: [("discipline".to_owned(), 6.0)].into(),
        age: Some(38),
        notes: None,
    });
    id
}

/// Seed a stored recommendation and return its id
pub fn seed_recommendation(store: &InMemoryStore, sessions_per_week: u32) -> Uuid {
    let id = Uuid::new_v4();
    store.insert_recommendation(StoredRecommendation {
        id,
        questionnaire_id: Uuid::new_v4(),
        structure: RecommendationStructure {
            client_type: "The Rebuilder".to_owned(),
            sessions_per_week,
            session_length_minutes: 60,
            training_style: "upper/lower split".to_owned(),
            plan_structure: serde_json::json!({"weeks": 8, "progression": "linear"}),
            reasoning: String::new(),
        },
    });
    id
}

/// Seed one workout in the given state
pub fn seed_workout(
    store: &InMemoryStore,
    recommendation_id: Uuid,
    week: u32,
    session: u32,
    exercise: &str,
    state: WorkoutState,
) {
    store.insert_workout(
        recommendation_id,
        Workout {
            week,
            session,
            name: format!("Session {session}"),
            exercises: vec![ExercisePrescription {
                name: exercise.to_owned(),
                sets: 3,
                reps: "8-10".to_owned(),
                load: "70kg".to_owned(),
                rest: Some("2 min".to_owned()),
                notes: None,
            }],
            reasoning: None,
            state,
        },
    );
}

/// Seed logged performance for one workout
pub fn seed_actual(
    store: &InMemoryStore,
    recommendation_id: Uuid,
    week: u32,
    session: u32,
    exercise: &str,
    rir: Vec<u32>,
) {
    store.insert_actual(
        recommendation_id,
        ActualWorkout {
            week,
            session,
            exercises: vec![ExercisePerformance {
                exercise: exercise.to_owned(),
                actual_reps: vec![8, 8, 7],
                actual_load: "70kg".to_owned(),
                rir,
                notes: None,
            }],
            session_rir: Some(1),
            energy_level: Some(7),
            trainer_observations: None,
        },
    );
}

/// A structure-stage response body the pipeline accepts
pub fn structure_json(sessions_per_week: u32) -> String {
    serde_json::json!({
        "client_type": "The Rebuilder",
        "sessions_per_week": sessions_per_week,
        "session_length_minutes": 60,
        "training_style": "upper/lower split",
        "plan_structure": {"weeks": 8, "progression": "linear"},
        "reasoning": "returning lifter, rebuild base first"
    })
    .to_string()
}

/// A workout-stage response body with `count` sessions tagged for `week`
pub fn workouts_json(week: u32, count: u32) -> String {
    let workouts: Vec<serde_json::Value> = (1..=count)
        .map(|session| {
            serde_json::json!({
                "week": week,
                "session": session,
                "name": format!("Session {session}"),
                "exercises": [
                    {"name": "Back Squat", "sets": 3, "reps": "8-10", "load": "70kg"}
                ],
                "reasoning": "base volume"
            })
        })
        .collect();
    serde_json::json!({ "workouts": workouts }).to_string()
}
