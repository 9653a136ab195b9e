// ABOUTME: Integration tests for JSON extraction and repair from raw model output
// ABOUTME: Covers prose/fence wrapping, truncation repair, idempotence, and diagnostics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use plansmith::errors::ErrorCode;
use plansmith::extraction::extract_json;
use plansmith::models::RecommendationStructure;

// =============================================================================
// Clean and wrapped input
// =============================================================================

#[test]
fn test_valid_json_extracted_byte_exact() {
    let payload = r#"{"client_type": "The Rebuilder", "sessions_per_week": 3}"#;
    let extracted = extract_json(payload).unwrap();
    assert_eq!(extracted.text, payload);
    assert!(!extracted.repaired);
}

#[test]
fn test_object_embedded_in_prose() {
    let raw = format!(
        "Here is the plan you asked for:\n\n{}\n\nLet me know if you want changes.",
        r#"{"client_type": "The Builder", "sessions_per_week": 4}"#
    );
    let extracted = extract_json(&raw).unwrap();
    assert_eq!(
        extracted.text,
        r#"{"client_type": "The Builder", "sessions_per_week": 4}"#
    );
    assert!(!extracted.repaired);
}

#[test]
fn test_markdown_fenced_object() {
    let raw = "```json\n{\"sessions_per_week\": 3}\n```";
    let extracted = extract_json(raw).unwrap();
    assert_eq!(extracted.value["sessions_per_week"], 3);
    assert!(!extracted.repaired);
}

#[test]
fn test_extraction_is_idempotent_on_its_own_output() {
    let raw = "Sure! ```json\n{\"a\": {\"b\": [1, 2, 3]}}\n``` hope that helps";
    let first = extract_json(raw).unwrap();
    let second = extract_json(&first.text).unwrap();
    assert_eq!(first.text, second.text);
    assert_eq!(first.value, second.value);
}

// =============================================================================
// Truncation repair
// =============================================================================

#[test]
fn test_truncated_mid_string_repairs_to_parseable_prefix() {
    let full = r#"{"client_type": "The Rebuilder", "workouts": [{"name": "Session 1", "load": "70kg"}, {"name": "Sess"#;
    let extracted = extract_json(full).unwrap();
    assert!(extracted.repaired);
    // The repaired text is valid JSON and keeps the fully closed entries.
    assert_eq!(extracted.value["client_type"], "The Rebuilder");
    let workouts = extracted.value["workouts"].as_array().unwrap();
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0]["name"], "Session 1");
}

#[test]
fn test_truncation_repair_across_cut_points() {
    let full = r#"{"client_type": "The Rebuilder", "sessions_per_week": 3, "plan_structure": {"weeks": 8, "methods": ["linear", "wave"]}, "reasoning": "rebuild the base first"}"#;

    // Any truncation past the first complete key/value pair must still yield
    // parseable JSON preserving the early fields.
    for cut in 40..full.len() {
        if !full.is_char_boundary(cut) {
            continue;
        }
        let truncated = &full[..cut];
        let extracted = extract_json(truncated)
            .unwrap_or_else(|e| panic!("cut at {cut} not recovered: {e}"));
        assert_eq!(
            extracted.value["client_type"], "The Rebuilder",
            "cut at {cut} lost the persona field"
        );
    }
}

#[test]
fn test_rebuilder_truncation_scenario() {
    // A structure response cut off by the output-token limit mid-way through
    // the plan skeleton. The persona and cadence must survive repair.
    let truncated = r#"{"client_type": "The Rebuilder", "sessions_per_week": 3, "session_length_minutes": 60, "training_style": "upper/lower split", "plan_structure": {"weeks": 8, "weekly_narrative": "Start conservative and re"#;

    let extracted = extract_json(truncated).unwrap();
    assert!(extracted.repaired);

    let structure: RecommendationStructure = serde_json::from_value(extracted.value).unwrap();
    assert_eq!(structure.client_type, "The Rebuilder");
    assert_eq!(structure.sessions_per_week, 3);
}

#[test]
fn test_trailing_comma_after_truncation() {
    let raw = r#"{"workouts": [{"week": 1, "session": 1, "name": "A"},"#;
    let extracted = extract_json(raw).unwrap();
    assert!(extracted.repaired);
    assert_eq!(extracted.value["workouts"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Unrecoverable input
// =============================================================================

#[test]
fn test_no_object_at_all_is_diagnosable() {
    let err = extract_json("I cannot produce a plan for this request.").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
}

#[test]
fn test_diagnostic_carries_offset_and_snippet() {
    let err = extract_json("{\"a\": nope}").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
    let details = &err.context.details;
    assert!(details.get("offset").is_some());
    assert!(details.get("snippet").is_some());
    assert!(details.get("path").is_some());
}
