//! Lenient JSON extraction for model output.
//!
//! Chat models wrap JSON in code fences or pad it with prose. This strips the
//! noise down to the outermost `{ ... }` object before deserializing, and
//! nothing else: repairing truncated or structurally broken JSON is out of
//! contract and surfaces as a parse error.

use serde::de::DeserializeOwned;

use crate::error::Error;

/// Extract and deserialize the first JSON object found in `raw`.
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, Error> {
    let candidate = isolate_object(raw).ok_or(Error::Parse("JSON object in model output"))?;
    Ok(serde_json::from_str(candidate)?)
}

/// Slice `raw` down to the outermost `{`..`}` span, skipping code-fence
/// markers and any leading/trailing non-JSON text.
fn isolate_object(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start <= end).then(|| &trimmed[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn clean_json_passes_through() {
        let v: Value = extract_json(r#"{"summary": "ok"}"#).unwrap();
        assert_eq!(v["summary"], "ok");
    }

    #[test]
    fn code_fences_are_stripped() {
        let raw = "```json\n{\"summary\": \"fenced\"}\n```";
        let v: Value = extract_json(raw).unwrap();
        assert_eq!(v["summary"], "fenced");
    }

    #[test]
    fn surrounding_prose_is_discarded() {
        let raw = "Here is the analysis you asked for:\n{\"n\": 3}\nLet me know!";
        let v: Value = extract_json(raw).unwrap();
        assert_eq!(v["n"], 3);
    }

    #[test]
    fn nested_objects_keep_the_outermost_braces() {
        let raw = "x {\"a\": {\"b\": 1}} y";
        let v: Value = extract_json(raw).unwrap();
        assert_eq!(v["a"]["b"], 1);
    }

    #[test]
    fn missing_object_is_a_parse_error() {
        let result = extract_json::<Value>("no json here");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn structurally_broken_json_is_an_error() {
        let result = extract_json::<Value>("{\"unterminated\": ");
        assert!(result.is_err());
    }
}
