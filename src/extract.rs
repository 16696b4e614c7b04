//! Best-effort recovery of structured data from free-text model replies.
//!
//! Small models rarely return clean JSON: replies come wrapped in code fences,
//! prefixed with prose, or with the list we asked for flattened into a string.
//! Nothing here fails; an empty result tells the caller to fall back.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Recover a JSON object from `blob`, or an empty map if none can be found.
///
/// Tried in order: the whole blob, the span from the first `{` to the last `}`,
/// and the blob with a (possibly language-tagged) code fence stripped.
pub fn extract_json(blob: &str) -> Map<String, Value> {
  if let Some(map) = parse_object(blob) {
    return map;
  }

  if let (Some(start), Some(end)) = (blob.find('{'), blob.rfind('}')) {
    if start < end {
      if let Some(map) = parse_object(&blob[start..=end]) {
        return map;
      }
    }
  }

  let trimmed = blob.trim();
  if let Some(rest) = trimmed.strip_prefix("```") {
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    let rest = rest.trim();
    let rest = rest.strip_suffix("```").unwrap_or(rest).trim();
    if let Some(map) = parse_object(rest) {
      return map;
    }
  }

  Map::new()
}

fn parse_object(s: &str) -> Option<Map<String, Value>> {
  match serde_json::from_str::<Value>(s) {
    Ok(Value::Object(map)) => Some(map),
    _ => None,
  }
}

fn line_marker() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+").expect("valid bullet regex"))
}

fn inline_marker() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?:^|\s)(?:[-*•]|\d+[.)])\s+").expect("valid inline bullet regex"))
}

/// Normalize whatever shape a model used for a list of short strings
/// (suggestions, success criteria) into trimmed, non-empty items.
pub fn normalize_suggestions(value: &Value) -> Vec<String> {
  match value {
    Value::Null => Vec::new(),
    Value::Array(items) => items.iter().filter_map(stringify_item).collect(),
    Value::Object(map) => map.values().filter_map(stringify_item).collect(),
    Value::String(s) => split_text_list(s),
    other => vec![other.to_string()],
  }
}

fn stringify_item(v: &Value) -> Option<String> {
  let s = match v {
    Value::String(s) => s.trim().to_string(),
    Value::Null => return None,
    other => other.to_string().trim().to_string(),
  };
  if s.is_empty() { None } else { Some(s) }
}

fn split_text_list(s: &str) -> Vec<String> {
  let lines: Vec<String> = s
    .lines()
    .map(|l| line_marker().replace(l, "").trim().to_string())
    .filter(|l| !l.is_empty())
    .collect();
  if lines.len() >= 2 {
    return lines;
  }

  let parts: Vec<String> = inline_marker()
    .split(s)
    .map(|p| p.trim().to_string())
    .filter(|p| !p.is_empty())
    .collect();
  if parts.len() >= 2 {
    return parts;
  }

  let whole = s.trim();
  if whole.is_empty() { Vec::new() } else { vec![whole.to_string()] }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn extracts_object_surrounded_by_noise() {
    let map = extract_json("noise {\"a\":1} trailing");
    assert_eq!(Value::Object(map), json!({"a": 1}));
  }

  #[test]
  fn extracts_from_language_tagged_fence() {
    let map = extract_json("```json\n{\"a\":1}\n```");
    assert_eq!(Value::Object(map), json!({"a": 1}));
  }

  #[test]
  fn fenced_nested_object_parses() {
    let map = extract_json("```\n{\"scores\": {\"tone\": 80}, \"total\": 80}\n```");
    assert_eq!(map.get("total"), Some(&json!(80)));
  }

  #[test]
  fn plain_text_yields_empty_map() {
    assert!(extract_json("not json at all").is_empty());
  }

  #[test]
  fn top_level_array_is_not_an_object() {
    assert!(extract_json("[1, 2, 3]").is_empty());
  }

  #[test]
  fn bulleted_lines_are_split_and_stripped() {
    let out = normalize_suggestions(&json!("- one\n- two\n- three"));
    assert_eq!(out, vec!["one", "two", "three"]);
  }

  #[test]
  fn inline_numbered_list_is_split() {
    let out = normalize_suggestions(&json!("1. Open with purpose 2. Trim filler"));
    assert_eq!(out, vec!["Open with purpose", "Trim filler"]);
  }

  #[test]
  fn single_line_is_one_suggestion() {
    let out = normalize_suggestions(&json!("single line no bullets"));
    assert_eq!(out, vec!["single line no bullets"]);
  }

  #[test]
  fn object_values_are_used_in_order() {
    let out = normalize_suggestions(&json!({"a": "x", "b": "y"}));
    assert_eq!(out, vec!["x", "y"]);
  }

  #[test]
  fn list_entries_are_trimmed_and_empties_dropped() {
    let out = normalize_suggestions(&json!(["  keep ", "", 7, null]));
    assert_eq!(out, vec!["keep", "7"]);
  }

  #[test]
  fn other_scalars_become_single_item() {
    assert_eq!(normalize_suggestions(&json!(42)), vec!["42"]);
    assert_eq!(normalize_suggestions(&json!(true)), vec!["true"]);
    assert!(normalize_suggestions(&Value::Null).is_empty());
  }
}
