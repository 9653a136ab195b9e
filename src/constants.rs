// ABOUTME: Named constants for job timing, retry policy, and parser bounds
// ABOUTME: Single source of truth for numeric knobs referenced across modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! Centralized constants so limits are named once instead of scattered as
//! magic numbers.

/// Timing and retry limits
pub mod limits {
    /// A `processing` job younger than this is treated as an active duplicate
    /// invocation; older than this it is considered abandoned and restarted.
    pub const STUCK_JOB_THRESHOLD_SECS: i64 = 300;

    /// Maximum completion attempts per model call (1 initial + retries),
    /// applied only to rate-limit failures.
    pub const MAX_COMPLETION_ATTEMPTS: u32 = 3;

    /// Initial backoff before the first rate-limit retry
    pub const INITIAL_BACKOFF_MS: u64 = 1_000;

    /// Ceiling for exponential backoff between retries
    pub const MAX_BACKOFF_MS: u64 = 30_000;

    /// Random jitter added to each backoff to avoid thundering herds
    pub const BACKOFF_JITTER_MS: u64 = 250;

    /// Output-token ceiling for the structure (stage 1) call
    pub const STRUCTURE_MAX_OUTPUT_TOKENS: u32 = 4_096;

    /// Output-token ceiling for workout generation calls
    pub const WORKOUT_MAX_OUTPUT_TOKENS: u32 = 8_192;

    /// Bounded lookahead window for the longest-prefix extraction fallback
    pub const MAX_SCAN_WINDOW: usize = 65_536;

    /// Maximum repair candidates tried while backing off past dangling keys
    pub const MAX_REPAIR_ATTEMPTS: usize = 16;

    /// Characters of surrounding text included in parse diagnostics
    pub const DIAGNOSTIC_SNIPPET_RADIUS: usize = 80;
}

/// Human-readable job phase labels persisted to `current_step`
pub mod steps {
    /// Job accepted, pipeline not yet started
    pub const STARTING: &str = "starting";
    /// Stage 1: generating the recommendation structure
    pub const GENERATING_STRUCTURE: &str = "generating structure";
    /// Stage 2: generating week-1 workouts
    pub const GENERATING_WORKOUTS: &str = "generating workouts";
    /// Progressive: aggregating prior-week performance
    pub const AGGREGATING_HISTORY: &str = "aggregating performance history";
    /// Progressive: generating the next week's workouts
    pub const GENERATING_PROGRESSIVE_WORKOUTS: &str = "generating progressive workouts";
    /// Persisting validated results
    pub const SAVING_RESULTS: &str = "saving results";
}

/// Service identity for logging
pub mod service {
    /// Service name reported in structured logs
    pub const NAME: &str = "plansmith";
}
