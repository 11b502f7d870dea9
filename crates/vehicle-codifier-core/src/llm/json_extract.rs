//! Extracts a JSON value from raw LLM chat output.
//!
//! Models routinely wrap their JSON answer in prose or a markdown fence;
//! every catalog-constrained prompt (C4 field discovery, C6 fallback
//! extraction, C9 rescoring) needs the same tolerant extraction step before
//! `serde_json` can parse it.

use serde_json::Value;

/// Find the first balanced `{...}` or `[...]` span in `text` and parse it.
/// Returns `None` if no balanced span parses as JSON.
pub fn extract_json_value(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    for (start, &b) in bytes.iter().enumerate() {
        let (open, close) = match b {
            b'{' => (b'{', b'}'),
            b'[' => (b'[', b']'),
            _ => continue,
        };
        if let Some(end) = matching_close(bytes, start, open, close) {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Some(value);
            }
        }
    }
    None
}

fn matching_close(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
