use regex::Regex;

lazy_static! {
    static ref OPENING_FENCE_RE: Regex = Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").unwrap();
    static ref CLOSING_FENCE_RE: Regex = Regex::new(r"\r?\n?```\s*$").unwrap();
    static ref LANGUAGE_TAG_RE: Regex = Regex::new(r"(?i)^json\b\s*").unwrap();
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();
}

const DOUBLE_QUOTES: [char; 5] = ['\u{201C}', '\u{201D}', '\u{201E}', '\u{201F}', '\u{2033}'];
const SINGLE_QUOTES: [char; 4] = ['\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}'];

/// Best-effort cleanup of raw model text before it is parsed as JSON.
///
/// Removes code fences and a leading `json` tag, normalizes typographic
/// quotes, unescapes `\"`, drops trailing commas before `}`/`]` and trims.
/// Never fails; the output may still be invalid JSON.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    text = OPENING_FENCE_RE.replace(&text, "").into_owned();
    text = CLOSING_FENCE_RE.replace(&text, "").into_owned();
    text = LANGUAGE_TAG_RE.replace(text.trim(), "").into_owned();

    text = text
        .chars()
        .map(|c| {
            if DOUBLE_QUOTES.contains(&c) {
                '"'
            } else if SINGLE_QUOTES.contains(&c) {
                '\''
            } else {
                c
            }
        })
        .collect();

    text = text.replace("\\\"", "\"");
    text = TRAILING_COMMA_RE.replace_all(&text, "$1").into_owned();

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn strips_fences_and_trailing_commas() {
        let sanitized = sanitize("```json\n{\"a\": 1,}\n```");
        let value: Value = serde_json::from_str(&sanitized).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn strips_bare_language_tag() {
        assert_eq!(sanitize("json\n{\"a\": [1, 2,]}"), "{\"a\": [1, 2]}");
        assert_eq!(sanitize("JSON {\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(sanitize("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn normalizes_smart_quotes() {
        let raw = "{\\\"template_id\\\": “87743020”, “text0”: “it’s fine”}";
        assert!(serde_json::from_str::<Value>(raw).is_err());

        let sanitized = sanitize(raw);
        let value: Value = serde_json::from_str(&sanitized).unwrap();
        assert_eq!(value["template_id"], "87743020");
        assert_eq!(value["text0"], "it's fine");
    }

    #[test]
    fn collapses_escaped_quotes() {
        assert_eq!(sanitize(r#"{\"a\": \"b\"}"#), r#"{"a": "b"}"#);
    }

    #[test]
    fn leaves_clean_json_alone() {
        let clean = r#"{"template_id": "1", "text0": "a, b", "text1": "[x]"}"#;
        assert_eq!(sanitize(clean), clean);
    }

    #[test]
    fn never_panics_on_garbage() {
        for raw in ["", "```", "json", ",}", "“", "```json```", "\\\\\""] {
            let _ = sanitize(raw);
        }
        assert_eq!(sanitize("  \n "), "");
    }
}
