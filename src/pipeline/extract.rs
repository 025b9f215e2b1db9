//! Extraction: find the first complete JSON object in the model's reply.
//!
//! Models asked to "return only the JSON object" still wrap it in prose,
//! code fences, or apologies often enough that the reply cannot be fed to a
//! JSON parser directly. A first-`{`-to-last-`}` slice is the obvious
//! shortcut and fails two ways: a stray `}` in trailing prose captures
//! garbage, and a reply with no braces degenerates into a nonsense slice.
//!
//! This module scans instead: from the first `{`, brace nesting depth is
//! tracked (string literals and escape sequences respected) until the object
//! closes. The returned slice is exactly one balanced object. Replies with
//! no object produce an explicit error, never a mis-slice.

use crate::error::ScanError;

/// Maximum reply characters echoed into [`ScanError::NoJsonObject`].
const PREVIEW_CHARS: usize = 60;

/// Extract the first complete, balanced JSON object from `reply`.
///
/// Candidate objects are tried in order of their opening brace: if the first
/// `{` never closes (truncated output), scanning resumes from the next `{`,
/// so a balanced object later in the reply is still found.
///
/// # Errors
/// * [`ScanError::NoJsonObject`] — the reply contains no `{` at all.
/// * [`ScanError::UnbalancedJson`] — every candidate object was left open.
pub fn extract_json_object(reply: &str) -> Result<&str, ScanError> {
    let mut search_from = 0;
    let mut first_open: Option<usize> = None;

    while let Some(rel) = reply[search_from..].find('{') {
        let start = search_from + rel;
        if first_open.is_none() {
            first_open = Some(start);
        }
        if let Some(len) = balanced_object_len(&reply[start..]) {
            return Ok(&reply[start..start + len]);
        }
        search_from = start + 1;
    }

    match first_open {
        Some(open_offset) => Err(ScanError::UnbalancedJson { open_offset }),
        None => Err(ScanError::NoJsonObject {
            reply_preview: reply.chars().take(PREVIEW_CHARS).collect(),
        }),
    }
}

/// Byte length of the balanced object starting at `s[0]` (which is `{`),
/// or `None` if it never closes.
///
/// Braces inside string literals don't count toward nesting, and `\"` inside
/// a string does not terminate it.
fn balanced_object_len(s: &str) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"total":500,"business":"Cafe","items":[],"transaction_timestamp":"2024-01-01T10:00:00"}"#;

    #[test]
    fn bare_object_round_trips_unchanged() {
        assert_eq!(extract_json_object(SAMPLE).unwrap(), SAMPLE);
    }

    #[test]
    fn prose_wrapped_object_is_isolated() {
        let reply = format!("Here is the parsed receipt:\n\n{SAMPLE}\n\nLet me know if you need anything else!");
        assert_eq!(extract_json_object(&reply).unwrap(), SAMPLE);
    }

    #[test]
    fn stray_trailing_brace_is_not_captured() {
        // The original first-{/last-} slice would swallow "} and the rest".
        let reply = format!("{SAMPLE} (note: fields in braces {{}} follow your schema) }}");
        assert_eq!(extract_json_object(&reply).unwrap(), SAMPLE);
    }

    #[test]
    fn nested_objects_balance() {
        let reply = r#"{"outer":{"inner":{"deep":1}},"after":2}"#;
        assert_eq!(extract_json_object(reply).unwrap(), reply);
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let reply = r#"{"business":"Waffles {and} Co.","total":100}"#;
        assert_eq!(extract_json_object(reply).unwrap(), reply);
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let reply = r#"{"business":"Joe's \"Diner\" {est. 1980}","total":5}"#;
        assert_eq!(extract_json_object(reply).unwrap(), reply);
    }

    #[test]
    fn pure_prose_is_no_json_object() {
        let result = extract_json_object("Sorry, the receipt text was unreadable.");
        match result {
            Err(ScanError::NoJsonObject { reply_preview }) => {
                assert!(reply_preview.starts_with("Sorry"));
            }
            other => panic!("expected NoJsonObject, got {other:?}"),
        }
    }

    #[test]
    fn empty_reply_is_no_json_object() {
        assert!(matches!(
            extract_json_object(""),
            Err(ScanError::NoJsonObject { .. })
        ));
    }

    #[test]
    fn close_brace_only_is_no_json_object() {
        assert!(matches!(
            extract_json_object("} nothing opened"),
            Err(ScanError::NoJsonObject { .. })
        ));
    }

    #[test]
    fn truncated_object_is_unbalanced() {
        let result = extract_json_object(r#"prefix {"total":500,"items":[{"title":"x""#);
        match result {
            Err(ScanError::UnbalancedJson { open_offset }) => assert_eq!(open_offset, 7),
            other => panic!("expected UnbalancedJson, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_first_candidate_falls_through_to_balanced_one() {
        // First "{" never closes; the scanner must still find the later
        // complete object instead of reporting the whole reply unbalanced.
        let reply = r#"schema hint: { then the answer: {"total":42,"business":"Kiosk"}"#;
        assert_eq!(
            extract_json_object(reply).unwrap(),
            r#"{"total":42,"business":"Kiosk"}"#
        );
    }

    #[test]
    fn multibyte_content_is_sliced_safely() {
        let reply = "résumé → {\"business\":\"Café Müller\",\"total\":990} ✓";
        assert_eq!(
            extract_json_object(reply).unwrap(),
            "{\"business\":\"Café Müller\",\"total\":990}"
        );
    }

    #[test]
    fn preview_is_bounded() {
        let long_prose = "x".repeat(500);
        match extract_json_object(&long_prose) {
            Err(ScanError::NoJsonObject { reply_preview }) => {
                assert!(reply_preview.chars().count() <= PREVIEW_CHARS);
            }
            other => panic!("expected NoJsonObject, got {other:?}"),
        }
    }
}
