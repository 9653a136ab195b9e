// ABOUTME: Repair pipeline turning truncated or wrapped model text into valid JSON
// ABOUTME: Fence stripping, error-offset recovery, truncate-and-close, prefix fallback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::scanner::{
    find_balanced_span, find_balanced_span_within, previous_structural_break,
    safe_truncation_point, scan_state_at,
};
use crate::constants::limits;
use crate::errors::{AppError, AppResult};

/// Result of a successful extraction
#[derive(Debug, Clone)]
pub struct ExtractedJson {
    /// The exact JSON text the value was parsed from
    pub text: String,
    /// The parsed value
    pub value: Value,
    /// Whether any repair was applied (false = sliced verbatim)
    pub repaired: bool,
}

/// Structural context attached to an unrecoverable parse failure
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
    /// Byte offset of the syntax error within the scanned text
    pub offset: usize,
    /// Text surrounding the offset
    pub snippet: String,
    /// Key path from the root to the failure position
    pub path: String,
    /// Nesting depth at the failure position
    pub depth: usize,
}

impl ParseDiagnostic {
    /// Build a diagnostic for the given offset
    #[must_use]
    pub fn at(text: &str, offset: usize) -> Self {
        let state = scan_state_at(text, offset);
        Self {
            offset,
            snippet: snippet_around(text, offset),
            path: state.path_string(),
            depth: state.depth,
        }
    }

    /// Convert into the application error the pipeline surfaces
    #[must_use]
    pub fn into_error(self) -> AppError {
        AppError::invalid_format(format!(
            "unable to extract JSON from model output (offset {}, path {}, depth {})",
            self.offset, self.path, self.depth
        ))
        .with_details(serde_json::json!({
            "offset": self.offset,
            "snippet": self.snippet,
            "path": self.path,
            "depth": self.depth,
        }))
    }
}

/// Extract one JSON object from raw model output, repairing if needed
///
/// See the module docs for the full strategy. Already-valid JSON is returned
/// byte-for-byte (idempotent); repairs yield the longest structurally
/// consistent prefix of the original.
///
/// # Errors
///
/// Returns an `InvalidFormat` error with a [`ParseDiagnostic`] payload when
/// no strategy recovers a parseable object. A parse failure never triggers
/// another model call.
pub fn extract_json(raw: &str) -> AppResult<ExtractedJson> {
    let cleaned = strip_markdown_fences(raw.trim());

    let Some(first_brace) = cleaned.find('{') else {
        return Err(ParseDiagnostic::at(cleaned, 0).into_error());
    };
    let body = &cleaned[first_brace..];

    // Fast path: a balanced top-level object that parses as-is.
    let mut balanced_error: Option<serde_json::Error> = None;
    if let Some(span) = find_balanced_span(body) {
        let slice = &body[span.start..span.end];
        match serde_json::from_str::<Value>(slice) {
            Ok(value) => {
                return Ok(ExtractedJson {
                    text: slice.to_owned(),
                    value,
                    repaired: false,
                })
            }
            Err(e) => balanced_error = Some(e),
        }
    }

    // Truncated (or balanced-but-invalid): locate the syntax error.
    let parse_error = match balanced_error {
        Some(e) => e,
        None => match serde_json::from_str::<Value>(body) {
            Ok(value) => {
                return Ok(ExtractedJson {
                    text: body.to_owned(),
                    value,
                    repaired: false,
                })
            }
            Err(e) => e,
        },
    };

    let offset = syntax_error_offset(body, &parse_error);
    debug!(offset, "model output failed direct parse, attempting repair");

    if let Some((repaired, value, cut)) = repair_with_backoff(body, offset) {
        warn!(
            offset,
            cut,
            "repaired truncated model output ({} of {} bytes kept)",
            cut,
            body.len()
        );
        return Ok(ExtractedJson {
            text: repaired,
            value,
            repaired: true,
        });
    }

    // Last resort: the longest prefix forming one complete top-level object.
    if let Some(span) = find_balanced_span_within(body, limits::MAX_SCAN_WINDOW) {
        let slice = &body[span.start..span.end];
        if let Ok(value) = serde_json::from_str::<Value>(slice) {
            warn!("recovered a complete object prefix from malformed output");
            return Ok(ExtractedJson {
                text: slice.to_owned(),
                value,
                repaired: true,
            });
        }
    }

    Err(ParseDiagnostic::at(body, offset).into_error())
}

/// Strip leading/trailing markdown code fences (``` or ```json)
fn strip_markdown_fences(text: &str) -> &str {
    let mut s = text.trim();

    if s.starts_with("```") {
        // Drop the fence line, including any language tag.
        s = s.find('\n').map_or("", |nl| &s[nl + 1..]);
    }
    if let Some(stripped) = s.trim_end().strip_suffix("```") {
        s = stripped;
    }

    s.trim()
}

/// Extract the absolute byte offset of a JSON syntax error
///
/// Supports both "position N" and "line L column C" message formats; the
/// latter is converted to an absolute offset against the parsed text.
fn syntax_error_offset(text: &str, error: &serde_json::Error) -> usize {
    static POSITION_RE: OnceLock<Option<Regex>> = OnceLock::new();
    static LINE_COL_RE: OnceLock<Option<Regex>> = OnceLock::new();

    let message = error.to_string();

    let position_re = POSITION_RE.get_or_init(|| Regex::new(r"position (\d+)").ok());
    if let Some(caps) = position_re.as_ref().and_then(|re| re.captures(&message)) {
        if let Some(offset) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
            return offset.min(text.len());
        }
    }

    let line_col_re = LINE_COL_RE.get_or_init(|| Regex::new(r"line (\d+) column (\d+)").ok());
    if let Some(caps) = line_col_re.as_ref().and_then(|re| re.captures(&message)) {
        let line = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok());
        let column = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok());
        if let (Some(line), Some(column)) = (line, column) {
            return offset_from_line_col(text, line, column);
        }
    }

    // serde_json always tracks line/column even when the message format
    // changes between versions.
    offset_from_line_col(text, error.line(), error.column())
}

/// Convert 1-based line/column coordinates to an absolute byte offset
fn offset_from_line_col(text: &str, line: usize, column: usize) -> usize {
    let mut remaining_lines = line.saturating_sub(1);
    let mut offset = 0_usize;

    for (i, b) in text.bytes().enumerate() {
        if remaining_lines == 0 {
            break;
        }
        if b == b'\n' {
            remaining_lines -= 1;
            offset = i + 1;
        }
    }

    (offset + column.saturating_sub(1)).min(text.len())
}

/// Try repair cuts from the preferred truncation point backwards
///
/// The preferred cut can land just past a dangling key or partial literal
/// (`{"a": 1, "key"`), which no amount of delimiter-closing fixes. Each
/// failed candidate backs the cut off to the previous structural break and
/// tries again, bounded by [`limits::MAX_REPAIR_ATTEMPTS`].
fn repair_with_backoff(body: &str, offset: usize) -> Option<(String, Value, usize)> {
    let mut cut = safe_truncation_point(body, offset)?;

    for _ in 0..limits::MAX_REPAIR_ATTEMPTS {
        if let Some(candidate) = repair_truncated(body, cut) {
            if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                return Some((candidate, value, cut));
            }
        }
        cut = previous_structural_break(body, cut)?;
    }

    None
}

/// Build a repaired candidate from the prefix ending at `cut`
///
/// Closes an open string if needed, strips trailing commas, then closes open
/// arrays before their enclosing objects in nesting order. Returns `None`
/// when the prefix contains no opening brace to close.
fn repair_truncated(text: &str, cut: usize) -> Option<String> {
    let state = scan_state_at(text, cut);
    state.start?;

    let mut candidate = text[..cut.min(text.len())].to_owned();

    if state.in_string {
        candidate.push('"');
    }

    loop {
        let trimmed = candidate.trim_end();
        if let Some(without_comma) = trimmed.strip_suffix(',') {
            candidate = without_comma.to_owned();
        } else {
            candidate = trimmed.to_owned();
            break;
        }
    }

    for delim in state.open_delims.iter().rev() {
        candidate.push(if *delim == b'[' { ']' } else { '}' });
    }

    Some(candidate)
}

/// Text surrounding a byte offset, for diagnostics
fn snippet_around(text: &str, offset: usize) -> String {
    let radius = limits::DIAGNOSTIC_SNIPPET_RADIUS;
    let start = offset.saturating_sub(radius);
    let end = (offset + radius).min(text.len());

    let start = floor_boundary(text, start);
    let end = floor_boundary(text, end);
    text[start..end].to_owned()
}

/// Largest char-boundary offset not exceeding `index`
fn floor_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_with_language_tag() {
        let wrapped = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_markdown_fences(wrapped), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_no_fence() {
        assert_eq!(strip_markdown_fences(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_offset_from_line_col() {
        let text = "ab\ncde\nfg";
        assert_eq!(offset_from_line_col(text, 1, 1), 0);
        assert_eq!(offset_from_line_col(text, 2, 2), 4);
        assert_eq!(offset_from_line_col(text, 3, 1), 7);
        // Out-of-range coordinates clamp to the text length.
        assert_eq!(offset_from_line_col(text, 9, 9), text.len());
    }

    #[test]
    fn test_syntax_error_offset_from_serde_message() {
        let text = r#"{"a": }"#;
        let err = serde_json::from_str::<Value>(text).unwrap_err();
        let offset = syntax_error_offset(text, &err);
        assert!(offset <= text.len());
        assert!(offset >= 6);
    }

    #[test]
    fn test_repair_truncated_closes_in_nesting_order() {
        let text = r#"{"a": [1, 2"#;
        let repaired = repair_truncated(text, text.len()).unwrap();
        assert_eq!(repaired, r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn test_repair_truncated_strips_trailing_comma() {
        let text = r#"{"a": [1, 2,"#;
        let repaired = repair_truncated(text, text.len()).unwrap();
        assert_eq!(repaired, r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn test_repair_truncated_closes_open_string() {
        let text = r#"{"a": "half"#;
        let repaired = repair_truncated(text, text.len()).unwrap();
        assert_eq!(repaired, r#"{"a": "half"}"#);
    }

    #[test]
    fn test_backoff_past_dangling_key() {
        let text = r#"{"a": 1, "dangling_key""#;
        let (repaired, value, _) = repair_with_backoff(text, text.len()).unwrap();
        assert_eq!(repaired, r#"{"a": 1}"#);
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_backoff_past_dangling_colon() {
        let text = r#"{"a": 1, "b":"#;
        let (repaired, _, _) = repair_with_backoff(text, text.len()).unwrap();
        assert_eq!(repaired, r#"{"a": 1}"#);
    }
}
