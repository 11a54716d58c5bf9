//! Helpers for digging structured JSON out of model responses.
//!
//! Models wrap JSON in markdown fences, preamble text, or trailing prose.
//! These helpers strip the noise before handing off to serde.

use serde_json::Value;

use crate::error::{Error, Result};

/// Strip markdown code fences (```json ... ``` or ``` ... ```) if present.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Extract the first JSON object from a response, tolerating surrounding text.
pub fn extract_json_object(text: &str) -> Result<Value> {
    let cleaned = strip_code_fences(text);
    let start = cleaned
        .find('{')
        .ok_or_else(|| Error::Parse("No JSON object in AI response".into()))?;
    let end = cleaned
        .rfind('}')
        .ok_or_else(|| Error::Parse("Unterminated JSON object in AI response".into()))?;
    if end < start {
        return Err(Error::Parse("Malformed JSON object in AI response".into()));
    }
    Ok(serde_json::from_str(&cleaned[start..=end])?)
}

/// Extract the first JSON array from a response, tolerating surrounding text.
pub fn extract_json_array(text: &str) -> Result<Value> {
    let cleaned = strip_code_fences(text);
    let start = cleaned
        .find('[')
        .ok_or_else(|| Error::Parse("No JSON array in AI response".into()))?;
    let end = cleaned
        .rfind(']')
        .ok_or_else(|| Error::Parse("Unterminated JSON array in AI response".into()))?;
    if end < start {
        return Err(Error::Parse("Malformed JSON array in AI response".into()));
    }
    Ok(serde_json::from_str(&cleaned[start..=end])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_extract_json_object_with_preamble() {
        let text = "Here is the result:\n{\"transactions\": []}\nHope that helps!";
        let value = extract_json_object(text).unwrap();
        assert!(value["transactions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_extract_json_array_fenced() {
        let text = "```json\n[[0, \"12\"], [1, null]]\n```";
        let value = extract_json_array(text).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert!(value[1][1].is_null());
    }

    #[test]
    fn test_extract_json_object_missing() {
        assert!(extract_json_object("no json here").is_err());
    }
}
