// ABOUTME: Reusable brace/string tokenizer for scanning raw model output
// ABOUTME: Exposes balanced-span search, safe truncation points, and nesting state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Plansmith Labs

//! # JSON Structure Scanner
//!
//! One tokenizer for every place the extractor needs to walk raw text while
//! respecting JSON string and escape rules. Three pure operations:
//!
//! - [`find_balanced_span`]: locate the first complete top-level `{...}`
//! - [`safe_truncation_point`]: the last position before an offset where a
//!   cut leaves structurally recoverable text
//! - [`scan_state_at`]: nesting state (open delimiters, string state, key
//!   path) at an arbitrary position, used by repair and diagnostics
//!
//! All offsets are byte offsets into the input.

/// Byte range of a balanced top-level JSON object, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancedSpan {
    /// Offset of the opening `{`
    pub start: usize,
    /// Offset one past the matching `}`
    pub end: usize,
}

/// One open `{` or `[` frame during a scan
#[derive(Debug, Clone)]
struct Frame {
    /// Opening delimiter, `b'{'` or `b'['`
    delim: u8,
    /// Object key whose value this frame is, if known
    key: Option<String>,
    /// Key seen but whose value has not started yet (objects only)
    pending_key: Option<String>,
}

/// Nesting state of the input at a scan position
#[derive(Debug, Clone)]
pub struct ScanState {
    /// Offset of the first `{`, if any
    pub start: Option<usize>,
    /// Current nesting depth (open objects + arrays)
    pub depth: usize,
    /// Whether the position falls inside an unterminated string
    pub in_string: bool,
    /// Open delimiters from outermost to innermost (`{` / `[`)
    pub open_delims: Vec<u8>,
    /// Key path from the root to the position, for diagnostics
    pub path: Vec<String>,
}

impl ScanState {
    /// Render the key path as a dotted string ("plan_structure.weeks[]")
    #[must_use]
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            "$".to_owned()
        } else {
            self.path.join(".")
        }
    }
}

/// Find the first complete top-level `{...}` object
///
/// Scans from the first `{`, tracking brace depth and string state
/// (toggled on unescaped `"`, skipping the character after a backslash).
/// Returns the exact balanced span when depth returns to zero.
#[must_use]
pub fn find_balanced_span(input: &str) -> Option<BalancedSpan> {
    find_balanced_span_within(input, usize::MAX)
}

/// [`find_balanced_span`] with a bounded lookahead window past the first `{`
#[must_use]
pub fn find_balanced_span_within(input: &str, window: usize) -> Option<BalancedSpan> {
    let start = input.find('{')?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;

    for (rel, c) in input[start..].char_indices() {
        if rel > window {
            return None;
        }
        let i = start + rel;

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(BalancedSpan { start, end: i + 1 });
                }
            }
            _ => {}
        }
    }

    None
}

/// Nesting state at byte offset `limit` (clamped to the input length)
///
/// Scanning starts at the first `{`; everything before it is prose and
/// ignored. Key names are tracked so diagnostics can report where in the
/// document a failure occurred.
#[must_use]
pub fn scan_state_at(input: &str, limit: usize) -> ScanState {
    let limit = floor_char_boundary(input, limit.min(input.len()));

    let Some(start) = input.find('{') else {
        return ScanState {
            start: None,
            depth: 0,
            in_string: false,
            open_delims: Vec::new(),
            path: Vec::new(),
        };
    };

    let mut frames: Vec<Frame> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut string_buf = String::new();
    let mut last_string: Option<String> = None;

    for (rel, c) in input[start..limit.max(start)].char_indices() {
        let _ = rel;

        if in_string {
            if escaped {
                escaped = false;
                string_buf.push(c);
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                last_string = Some(std::mem::take(&mut string_buf));
            } else {
                string_buf.push(c);
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                string_buf.clear();
            }
            ':' => {
                if let Some(frame) = frames.last_mut() {
                    if frame.delim == b'{' {
                        frame.pending_key = last_string.take();
                    }
                }
            }
            ',' => {
                if let Some(frame) = frames.last_mut() {
                    frame.pending_key = None;
                }
            }
            '{' | '[' => {
                let key = frames.last_mut().and_then(|f| f.pending_key.take());
                frames.push(Frame {
                    delim: if c == '{' { b'{' } else { b'[' },
                    key,
                    pending_key: None,
                });
            }
            '}' | ']' => {
                frames.pop();
            }
            _ => {}
        }
    }

    let mut path: Vec<String> = Vec::new();
    for frame in &frames {
        if let Some(key) = &frame.key {
            if frame.delim == b'[' {
                path.push(format!("{key}[]"));
            } else {
                path.push(key.clone());
            }
        } else if frame.delim == b'[' {
            path.push("[]".to_owned());
        }
    }
    if let Some(pending) = frames.last().and_then(|f| f.pending_key.clone()) {
        path.push(pending);
    }

    ScanState {
        start: Some(start),
        depth: frames.len(),
        in_string,
        open_delims: frames.iter().map(|f| f.delim).collect(),
        path,
    }
}

/// Compute the last safe truncation point strictly before `limit`
///
/// Preference order:
/// 1. the end of the last fully-closed nested `{...}` object seen while
///    scanning up to `limit`
/// 2. if `limit` falls inside an unterminated string, the nearest preceding
///    `}`, `]`, or `,` outside any string
/// 3. otherwise `limit` itself (clamped to a char boundary)
///
/// Returns `None` when the input contains no `{` at all.
#[must_use]
pub fn safe_truncation_point(input: &str, limit: usize) -> Option<usize> {
    let limit = floor_char_boundary(input, limit.min(input.len()));
    let start = input.find('{')?;
    let scan_end = limit.max(start);

    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut last_closed_object: Option<usize> = None;
    let mut last_safe_break: Option<usize> = None;

    for (rel, c) in input[start..scan_end].char_indices() {
        let i = start + rel;

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                // A nested object fully closed; the root closing brace would
                // have made the whole span balanced already.
                if depth >= 1 {
                    last_closed_object = Some(i + 1);
                }
                last_safe_break = Some(i + 1);
            }
            ']' | ',' => {
                if c == ']' {
                    depth = depth.saturating_sub(1);
                }
                last_safe_break = Some(i + 1);
            }
            _ => {}
        }
    }

    if let Some(end) = last_closed_object {
        return Some(end);
    }
    if in_string {
        return last_safe_break;
    }
    Some(scan_end)
}

/// End offset of the last `,`, `}`, or `]` outside strings strictly before `before`
///
/// Used to back a repair cut off past a dangling key or partial literal that
/// the preferred truncation point left behind.
#[must_use]
pub fn previous_structural_break(input: &str, before: usize) -> Option<usize> {
    let before = floor_char_boundary(input, before.min(input.len()));
    let start = input.find('{')?;
    if before <= start {
        return None;
    }

    let mut in_string = false;
    let mut escaped = false;
    let mut last_break: Option<usize> = None;

    for (rel, c) in input[start..before].char_indices() {
        let i = start + rel;

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '}' | ']' | ',' if i + 1 < before => last_break = Some(i + 1),
            _ => {}
        }
    }

    last_break
}

/// Largest char-boundary offset not exceeding `index`
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
