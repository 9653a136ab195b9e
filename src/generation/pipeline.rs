// ABOUTME: Two-stage plan generation pipeline driving model calls and persistence
// ABOUTME: Stage 1 builds the structure, stage 2 the workouts; week N reuses stage 2 with history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::prompts::{structure_prompt, workout_prompt};
use super::validation::{validate_structure, workouts_from_value};
use super::{GenerationOutcome, GenerationResult};
use crate::constants::{limits, steps};
use crate::errors::{AppError, AppResult};
use crate::extraction::extract_json;
use crate::jobs::CancellationToken;
use crate::llm::{complete_with_retry, ChatMessage, ChatRequest, LlmProvider};
use crate::models::{RecommendationStructure, Workout};
use crate::performance::{build_history_narrative, collect_snapshots};
use crate::storage::PlanStore;

/// Default sampling temperature for plan generation calls
const GENERATION_TEMPERATURE: f32 = 0.7;

/// Orchestrates the model calls that produce a plan
///
/// Holds the read/write store and the provider; job bookkeeping stays with
/// the dispatcher, which hands a [`CancellationToken`] into each run.
pub struct PlanGenerator {
    plans: Arc<dyn PlanStore>,
    provider: Arc<dyn LlmProvider>,
}

impl PlanGenerator {
    /// Create a generator over the given collaborators
    #[must_use]
    pub fn new(plans: Arc<dyn PlanStore>, provider: Arc<dyn LlmProvider>) -> Self {
        Self { plans, provider }
    }

    /// Generate the initial plan for a questionnaire
    ///
    /// Stage 1 produces the recommendation structure, stage 2 the week-1
    /// workouts. Nothing is persisted until both stages validate; a
    /// cancellation observed at any checkpoint discards all stage output.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown questionnaire, plus any provider,
    /// extraction, or validation failure.
    #[instrument(skip(self, token), fields(questionnaire_id = %questionnaire_id))]
    pub async fn generate_initial(
        &self,
        questionnaire_id: Uuid,
        token: &CancellationToken,
    ) -> AppResult<GenerationOutcome> {
        let questionnaire = self
            .plans
            .get_questionnaire(questionnaire_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Questionnaire {questionnaire_id}")))?;
        let metrics = self.plans.get_body_metrics(questionnaire_id).await?;

        if token.checkpoint(steps::GENERATING_STRUCTURE).await? {
            return Ok(GenerationOutcome::Cancelled);
        }
        let structure = self
            .run_structure_stage(structure_prompt(&questionnaire, metrics.as_ref()))
            .await?;

        if token.checkpoint(steps::GENERATING_WORKOUTS).await? {
            return Ok(GenerationOutcome::Cancelled);
        }
        let workouts = self
            .run_workout_stage(
                workout_prompt(&structure, 1, Some(&questionnaire), metrics.as_ref(), None),
                1,
                &structure,
            )
            .await?;

        if token.checkpoint(steps::SAVING_RESULTS).await? {
            return Ok(GenerationOutcome::Cancelled);
        }
        let recommendation_id = self
            .plans
            .save_recommendation(questionnaire_id, &structure)
            .await?;
        self.plans
            .save_workouts(recommendation_id, &workouts)
            .await?;

        info!(
            recommendation_id = %recommendation_id,
            client_type = %structure.client_type,
            workouts = workouts.len(),
            "initial plan generated"
        );

        Ok(GenerationOutcome::Completed(GenerationResult::InitialPlan {
            recommendation_id,
            structure,
            workouts,
        }))
    }

    /// Generate one progressive week for an existing recommendation
    ///
    /// Aggregates logged performance from every prior week into a narrative
    /// and reruns the workout stage against it.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for an unknown recommendation, plus any provider,
    /// extraction, or validation failure.
    #[instrument(skip(self, token), fields(recommendation_id = %recommendation_id, week))]
    pub async fn generate_progressive(
        &self,
        recommendation_id: Uuid,
        week: u32,
        token: &CancellationToken,
    ) -> AppResult<GenerationOutcome> {
        let recommendation = self
            .plans
            .get_recommendation(recommendation_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recommendation {recommendation_id}")))?;
        let questionnaire = self
            .plans
            .get_questionnaire(recommendation.questionnaire_id)
            .await?;
        let metrics = self
            .plans
            .get_body_metrics(recommendation.questionnaire_id)
            .await?;

        if token.checkpoint(steps::AGGREGATING_HISTORY).await? {
            return Ok(GenerationOutcome::Cancelled);
        }
        let snapshots = collect_snapshots(self.plans.as_ref(), recommendation_id, week).await?;
        let narrative = build_history_narrative(&snapshots);

        if token
            .checkpoint(steps::GENERATING_PROGRESSIVE_WORKOUTS)
            .await?
        {
            return Ok(GenerationOutcome::Cancelled);
        }
        let structure = &recommendation.structure;
        let history = if narrative.is_empty() {
            warn!(week, "no logged performance found for any prior week");
            None
        } else {
            Some(narrative.as_str())
        };
        let workouts = self
            .run_workout_stage(
                workout_prompt(structure, week, questionnaire.as_ref(), metrics.as_ref(), history),
                week,
                structure,
            )
            .await?;

        if token.checkpoint(steps::SAVING_RESULTS).await? {
            return Ok(GenerationOutcome::Cancelled);
        }
        self.plans
            .save_workouts(recommendation_id, &workouts)
            .await?;

        info!(
            recommendation_id = %recommendation_id,
            week,
            workouts = workouts.len(),
            "progressive week generated"
        );

        Ok(GenerationOutcome::Completed(
            GenerationResult::ProgressiveWeek {
                recommendation_id,
                week,
                workouts,
            },
        ))
    }

    async fn run_structure_stage(
        &self,
        messages: Vec<ChatMessage>,
    ) -> AppResult<RecommendationStructure> {
        let request = ChatRequest::new(messages)
            .with_temperature(GENERATION_TEMPERATURE)
            .with_max_tokens(limits::STRUCTURE_MAX_OUTPUT_TOKENS);

        let response = complete_with_retry(self.provider.as_ref(), &request).await?;
        if response.hit_length_limit() {
            warn!("structure response hit the output-token ceiling");
        }

        let extracted = extract_json(&response.content)?;
        let structure: RecommendationStructure = serde_json::from_value(extracted.value)
            .map_err(|e| {
                AppError::invalid_format("structure output does not match the expected shape")
                    .with_source(e)
            })?;
        validate_structure(&structure)?;
        Ok(structure)
    }

    async fn run_workout_stage(
        &self,
        messages: Vec<ChatMessage>,
        week: u32,
        structure: &RecommendationStructure,
    ) -> AppResult<Vec<Workout>> {
        let request = ChatRequest::new(messages)
            .with_temperature(GENERATION_TEMPERATURE)
            .with_max_tokens(limits::WORKOUT_MAX_OUTPUT_TOKENS);

        let response = complete_with_retry(self.provider.as_ref(), &request).await?;
        if response.hit_length_limit() {
            warn!(week, "workout response hit the output-token ceiling");
        }

        let extracted = extract_json(&response.content)?;
        workouts_from_value(&extracted.value, week, structure.sessions_per_week)
    }
}
