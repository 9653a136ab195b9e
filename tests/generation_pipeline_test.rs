// ABOUTME: Integration tests for the two-stage generation pipeline
// ABOUTME: Scripted provider drives structure, workout, and progressive-week flows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::{
    seed_actual, seed_questionnaire, seed_recommendation, seed_workout, structure_json,
    workouts_json, ScriptedProvider,
};
use plansmith::errors::ErrorCode;
use plansmith::generation::{GenerationOutcome, GenerationResult, PlanGenerator};
use plansmith::jobs::CancellationToken;
use plansmith::models::{Job, JobSubject, WorkoutState};
use plansmith::storage::memory::InMemoryStore;
use plansmith::storage::{JobStore, PlanStore};

async fn token_for(store: &Arc<InMemoryStore>) -> CancellationToken {
    let job = Job::new(JobSubject::Questionnaire {
        questionnaire_id: uuid::Uuid::new_v4(),
    });
    store.create(&job).await.unwrap();
    CancellationToken::new(store.clone(), job.id)
}

// =============================================================================
// Initial generation
// =============================================================================

#[tokio::test]
async fn test_initial_generation_runs_both_stages() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_content(structure_json(3));
    provider.push_content(workouts_json(1, 3));

    let questionnaire_id = seed_questionnaire(&store);
    let generator = PlanGenerator::new(store.clone(), provider.clone());
    let token = token_for(&store).await;

    let outcome = generator
        .generate_initial(questionnaire_id, &token)
        .await
        .unwrap();
    let GenerationOutcome::Completed(GenerationResult::InitialPlan {
        recommendation_id,
        structure,
        workouts,
    }) = outcome
    else {
        panic!("expected a completed initial plan");
    };

    assert_eq!(structure.client_type, "The Rebuilder");
    assert_eq!(workouts.len(), 3);
    assert!(workouts.iter().all(|w| w.week == 1));

    // Both the recommendation and the workouts were persisted.
    assert!(store
        .get_recommendation(recommendation_id)
        .await
        .unwrap()
        .is_some());
    assert_eq!(
        store
            .workouts_for_week(recommendation_id, 1)
            .await
            .unwrap()
            .len(),
        3
    );

    // Stage 1 saw the questionnaire, stage 2 the structure.
    let requests = provider.recorded_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].messages[1].content.contains("rebuild strength"));
    assert!(requests[1].messages[1].content.contains("The Rebuilder"));
}

#[tokio::test]
async fn test_initial_generation_recovers_truncated_structure() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    // Structure response cut off mid-way through the plan skeleton.
    provider.push_content(
        r#"{"client_type": "The Rebuilder", "sessions_per_week": 3, "session_length_minutes": 60, "training_style": "upper/lower split", "plan_structure": {"weeks": 8, "weekly_narrative": "Start conservative an"#,
    );
    provider.push_content(workouts_json(1, 3));

    let questionnaire_id = seed_questionnaire(&store);
    let generator = PlanGenerator::new(store.clone(), provider.clone());
    let token = token_for(&store).await;

    let outcome = generator
        .generate_initial(questionnaire_id, &token)
        .await
        .unwrap();
    let GenerationOutcome::Completed(GenerationResult::InitialPlan { structure, .. }) = outcome
    else {
        panic!("expected a completed initial plan");
    };
    assert_eq!(structure.client_type, "The Rebuilder");
    assert_eq!(structure.sessions_per_week, 3);
}

#[tokio::test]
async fn test_wrong_week_workouts_are_filtered() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_content(structure_json(2));
    // Two good week-1 sessions plus a stray week-2 entry.
    provider.push_content(
        serde_json::json!({"workouts": [
            {"week": 1, "session": 1, "name": "A", "exercises": []},
            {"week": 2, "session": 1, "name": "stray", "exercises": []},
            {"week": 1, "session": 2, "name": "B", "exercises": []},
        ]})
        .to_string(),
    );

    let questionnaire_id = seed_questionnaire(&store);
    let generator = PlanGenerator::new(store.clone(), provider.clone());
    let token = token_for(&store).await;

    let outcome = generator
        .generate_initial(questionnaire_id, &token)
        .await
        .unwrap();
    let GenerationOutcome::Completed(GenerationResult::InitialPlan { workouts, .. }) = outcome
    else {
        panic!("expected a completed initial plan");
    };
    assert_eq!(workouts.len(), 2);
    assert!(workouts.iter().all(|w| w.week == 1));
}

#[tokio::test]
async fn test_structure_missing_persona_fails() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_content(
        serde_json::json!({
            "sessions_per_week": 3,
            "session_length_minutes": 60,
            "training_style": "mixed"
        })
        .to_string(),
    );

    let questionnaire_id = seed_questionnaire(&store);
    let generator = PlanGenerator::new(store.clone(), provider.clone());
    let token = token_for(&store).await;

    let err = generator
        .generate_initial(questionnaire_id, &token)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);
    // Stage 2 never ran and nothing was persisted.
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_cancellation_mid_pipeline_discards_everything() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_content(structure_json(3));
    provider.push_content(workouts_json(1, 3));

    let questionnaire_id = seed_questionnaire(&store);
    let generator = PlanGenerator::new(store.clone(), provider.clone());
    let token = token_for(&store).await;

    // Cancel before the run starts; the first checkpoint observes it.
    store.mark_cancelled(token.job_id(), None).await.unwrap();

    let outcome = generator
        .generate_initial(questionnaire_id, &token)
        .await
        .unwrap();
    assert!(matches!(outcome, GenerationOutcome::Cancelled));
    assert_eq!(provider.call_count(), 0);
}

// =============================================================================
// Progressive generation
// =============================================================================

#[tokio::test]
async fn test_progressive_week_embeds_history_and_constraints() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_content(workouts_json(2, 2));

    let recommendation_id = seed_recommendation(&store, 2);
    seed_workout(&store, recommendation_id, 1, 1, "Back Squat", WorkoutState::Completed);
    seed_workout(&store, recommendation_id, 1, 2, "Bench Press", WorkoutState::Completed);
    // Every bench set was taken to failure in week 1.
    seed_actual(&store, recommendation_id, 1, 1, "Back Squat", vec![2, 2, 1]);
    seed_actual(&store, recommendation_id, 1, 2, "Bench Press", vec![0, 0, 0]);

    let generator = PlanGenerator::new(store.clone(), provider.clone());
    let token = token_for(&store).await;

    let outcome = generator
        .generate_progressive(recommendation_id, 2, &token)
        .await
        .unwrap();
    let GenerationOutcome::Completed(GenerationResult::ProgressiveWeek { week, workouts, .. }) =
        outcome
    else {
        panic!("expected a completed progressive week");
    };
    assert_eq!(week, 2);
    assert_eq!(workouts.len(), 2);

    // The prompt carried the week-1 history and the failure constraint.
    let requests = provider.recorded_requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].messages[1].content;
    assert!(prompt.contains("Week 1 performance:"));
    assert!(prompt.contains("Back Squat"));
    assert!(prompt.contains("CONSTRAINT"));
    assert!(prompt.contains("Do not increase its prescribed load"));
    assert!(prompt.contains("Preserve the plan's periodization"));
}

#[tokio::test]
async fn test_progressive_week_persists_new_workouts() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_content(workouts_json(3, 2));

    let recommendation_id = seed_recommendation(&store, 2);
    seed_workout(&store, recommendation_id, 2, 1, "Back Squat", WorkoutState::Completed);
    seed_actual(&store, recommendation_id, 2, 1, "Back Squat", vec![1, 1, 1]);

    let generator = PlanGenerator::new(store.clone(), provider.clone());
    let token = token_for(&store).await;

    generator
        .generate_progressive(recommendation_id, 3, &token)
        .await
        .unwrap();
    let saved = store.workouts_for_week(recommendation_id, 3).await.unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved.iter().all(|w| w.state == WorkoutState::Planned));
}

#[tokio::test]
async fn test_progressive_unknown_recommendation_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(ScriptedProvider::new());
    let generator = PlanGenerator::new(store.clone(), provider.clone());
    let token = token_for(&store).await;

    let err = generator
        .generate_progressive(uuid::Uuid::new_v4(), 2, &token)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
