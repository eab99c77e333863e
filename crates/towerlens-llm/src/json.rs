//! JSON recovery from model output
//!
//! Models wrap answers in prose, code fences and stray tokens. The scanner
//! walks candidate start positions (`{` or `[`), finds the matching close
//! bracket while skipping string contents, and returns the first candidate
//! that parses.

use serde_json::Value;

/// Byte offset one past the bracket closing the one at `start`
fn balanced_end(text: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in text[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// First balanced JSON object or array in `text` that parses
pub fn extract_json(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, &b)| b == b'{' || b == b'[')
        .find_map(|(start, _)| {
            let end = balanced_end(bytes, start)?;
            serde_json::from_str(&text[start..end]).ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_and_fenced() {
        assert_eq!(
            extract_json(r#"{"completed": 4, "non-completed": 2}"#),
            Some(json!({"completed": 4, "non-completed": 2}))
        );
        let fenced = "Here you go:\n```json\n[{\"Tower Name\": \"TOWER 2\"}]\n```\nHope it helps";
        assert_eq!(extract_json(fenced), Some(json!([{"Tower Name": "TOWER 2"}])));
    }

    #[test]
    fn braces_inside_strings() {
        let text = r#"result: {"note": "use } and { freely", "n": "[1]"} trailing"#;
        assert_eq!(
            extract_json(text),
            Some(json!({"note": "use } and { freely", "n": "[1]"}))
        );
    }

    #[test]
    fn escaped_quotes() {
        let text = r#"{"name": "Block \"B\" }", "ok": true}<|eom_id|>"#;
        assert_eq!(extract_json(text), Some(json!({"name": "Block \"B\" }", "ok": true})));
    }

    #[test]
    fn skips_malformed_candidates() {
        let text = "[TOWER 2] then {\"completed\": \"5\"}";
        assert_eq!(extract_json(text), Some(json!({"completed": "5"})));
    }

    #[test]
    fn nothing_to_find() {
        assert_eq!(extract_json(""), None);
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("{\"unterminated\": 1"), None);
        assert_eq!(extract_json("}{"), None);
    }
}
