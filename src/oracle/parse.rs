//! Turn the API's semi-structured responses into raw identifier lists.
//!
//! The API answers either with a structured list or with a free-text
//! `message` of space-separated names; both are accepted.

use serde_json::Value;

use super::flags::strip_flags;

/// Marker the API returns instead of data for protected records.
pub const RESTRICTED_MARKER: &str = "[**RESTRICTED DATA**]";

/// Fields checked, in order, for the neighbor list.
const LIST_FIELDS: &[&str] = &["message", "people", "places", "users", "data"];

/// Split a free-text message into identifier tokens.
///
/// Restricted records and messages carrying links are not name lists and
/// yield nothing. Flag markers are removed before splitting.
pub fn split_message(text: &str) -> Vec<String> {
    if text.contains(RESTRICTED_MARKER) {
        log::debug!("Restricted record, ignoring message");
        return Vec::new();
    }
    if text.to_lowercase().contains("http") {
        log::debug!("Message contains a link, ignoring: {}", text);
        return Vec::new();
    }
    strip_flags(text)
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn strings_from_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(strip_flags(s).trim().to_string()),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extract raw neighbor identifiers from an oracle response body.
pub fn neighbors_from_response(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => strings_from_list(items),
        Value::String(text) => split_message(text),
        Value::Object(map) => {
            for field in LIST_FIELDS {
                match map.get(*field) {
                    Some(Value::String(text)) => return split_message(text),
                    Some(Value::Array(items)) => return strings_from_list(items),
                    _ => {}
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_space_separated_message() {
        let value = json!({"code": 0, "message": "RAFAL BARBARA  ALEKSANDER"});
        assert_eq!(
            neighbors_from_response(&value),
            vec!["RAFAL", "BARBARA", "ALEKSANDER"]
        );
    }

    #[test]
    fn test_message_list() {
        let value = json!({"message": ["KRAKOW", " WARSZAWA ", 3]});
        assert_eq!(neighbors_from_response(&value), vec!["KRAKOW", "WARSZAWA"]);
    }

    #[test]
    fn test_alternative_fields_and_bare_list() {
        assert_eq!(
            neighbors_from_response(&json!({"people": ["ADAM"]})),
            vec!["ADAM"]
        );
        assert_eq!(
            neighbors_from_response(&json!({"data": [{"name": "GRUDZIADZ"}]})),
            vec!["GRUDZIADZ"]
        );
        assert_eq!(neighbors_from_response(&json!(["ELBLAG"])), vec!["ELBLAG"]);
    }

    #[test]
    fn test_restricted_data_yields_nothing() {
        let value = json!({"code": 0, "message": "[**RESTRICTED DATA**]"});
        assert!(neighbors_from_response(&value).is_empty());
    }

    #[test]
    fn test_links_yield_nothing() {
        let value = json!({"message": "see https://example.org/barbara.txt"});
        assert!(neighbors_from_response(&value).is_empty());
    }

    #[test]
    fn test_punctuation_is_trimmed() {
        assert_eq!(split_message("AZAZEL, GLITCH."), vec!["AZAZEL", "GLITCH"]);
    }

    #[test]
    fn test_flag_markers_are_not_names() {
        let value = json!({"code": 0, "message": "RAFAL {{FLG:SECRET}} KRAKOW"});
        assert_eq!(neighbors_from_response(&value), vec!["RAFAL", "KRAKOW"]);
        assert_eq!(
            neighbors_from_response(&json!(["ADAM", "flag{x}"])),
            vec!["ADAM"]
        );
    }

    #[test]
    fn test_unknown_shape_is_empty() {
        assert!(neighbors_from_response(&json!({"code": -200})).is_empty());
        assert!(neighbors_from_response(&json!(42)).is_empty());
    }
}
