// ABOUTME: Resilient extraction of structured JSON from raw model output
// ABOUTME: Recovers truncated or fence-wrapped payloads without extra model calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # Response Extraction and Repair
//!
//! Models are instructed to emit one JSON object but routinely wrap it in
//! prose or markdown fences, truncate it mid-token at the output-length
//! limit, or leave brackets and quotes unbalanced. Re-prompting would burn
//! tokens, so recovery is strictly local: at most one repair pass over the
//! text already paid for.
//!
//! Strategy, in order:
//!
//! 1. Strip markdown code fences.
//! 2. Slice the first balanced top-level `{...}` span and parse it.
//! 3. On truncation, parse the remainder directly and pull the syntax
//!    error's character offset out of the error.
//! 4. Cut back to the last safe truncation point before that offset.
//! 5. Repair: strip trailing commas, close an open string, then close open
//!    arrays and objects in nesting order, and re-parse.
//! 6. Fall back to the longest prefix forming one complete top-level object
//!    within a bounded window.
//! 7. Give up with a diagnosable error carrying offset, surrounding text,
//!    and structural context.
//!
//! The guarantee: [`extract_json`] either returns a value that parses as
//! well-formed JSON or returns an error. It never returns silently
//! corrupted data.

pub mod repair;
pub mod scanner;

pub use repair::{extract_json, ExtractedJson, ParseDiagnostic};
pub use scanner::{
    find_balanced_span, find_balanced_span_within, previous_structural_break,
    safe_truncation_point, scan_state_at, BalancedSpan, ScanState,
};
