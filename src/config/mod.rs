// ABOUTME: Environment-driven configuration for provider selection and job tuning
// ABOUTME: Contains LogLevel and LlmProviderType enums plus numeric knob helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # Configuration
//!
//! Configuration is environment-only: provider selection, model choice, API
//! keys, and operational knobs are all read from environment variables with
//! sensible defaults. The core passes model choice and authentication through
//! to the provider; it never manages them itself.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::limits;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level - only critical errors
    Error,
    /// Warning level - potential issues
    Warn,
    /// Info level - normal operational messages (default)
    #[default]
    Info,
    /// Debug level - detailed debugging information
    Debug,
    /// Trace level - very verbose tracing
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info, // Default fallback (including "info")
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// LLM provider selection for plan generation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Groq provider - LPU-accelerated inference for open models (default)
    #[default]
    Groq,
    /// Local LLM provider - `OpenAI`-compatible endpoint (Ollama, vLLM, `LocalAI`)
    Local,
}

impl LlmProviderType {
    /// Environment variable name for LLM provider selection
    pub const ENV_VAR: &'static str = "PLANSMITH_LLM_PROVIDER";

    /// Environment variable for model/version selection
    pub const MODEL_ENV_VAR: &'static str = "PLANSMITH_LLM_MODEL";

    /// Parse from string with fallback to default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "local" | "ollama" | "vllm" | "localai" => Self::Local,
            _ => Self::Groq, // Default fallback (including "groq")
        }
    }

    /// Load from environment variable
    #[must_use]
    pub fn from_env() -> Self {
        env::var(Self::ENV_VAR)
            .map(|s| Self::from_str_or_default(&s))
            .unwrap_or_default()
    }

    /// Get model from environment
    ///
    /// Reads `PLANSMITH_LLM_MODEL` - returns None if not set, in which case
    /// the provider's default model is used.
    #[must_use]
    pub fn model_from_env() -> Option<String> {
        env::var(Self::MODEL_ENV_VAR).ok().filter(|m| !m.is_empty())
    }
}

impl Display for LlmProviderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Groq => write!(f, "groq"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Environment variable overriding the stuck-job threshold (seconds)
pub const JOB_STUCK_SECS_ENV_VAR: &str = "PLANSMITH_JOB_STUCK_SECS";

/// Stuck-job threshold in seconds, overridable for operational tuning
///
/// Reads `PLANSMITH_JOB_STUCK_SECS` - defaults to 300 seconds.
#[must_use]
pub fn job_stuck_secs() -> i64 {
    env::var(JOB_STUCK_SECS_ENV_VAR)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(limits::STUCK_JOB_THRESHOLD_SECS)
}
