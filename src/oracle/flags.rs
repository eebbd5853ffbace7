//! Scan oracle responses for hidden flag strings.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn flag_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\{\{FLG:[^}]+\}\}",
            r"(?i)flag\{[^}]+\}",
            r"(?i)flag\[[^\]]+\]",
            r"(?i)flag\([^)]+\)",
            r"(?i)flag<[^>]+>",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

/// Blank out flag markers so they are not read as names.
pub fn strip_flags(text: &str) -> String {
    flag_patterns()
        .iter()
        .fold(text.to_string(), |acc, pattern| pattern.replace_all(&acc, " ").into_owned())
}

/// All distinct flag-looking substrings anywhere in a JSON value.
pub fn scan_flags(value: &Value) -> Vec<String> {
    let mut strings = Vec::new();
    collect_strings(value, &mut strings);

    let mut found: Vec<String> = Vec::new();
    for text in strings {
        for pattern in flag_patterns() {
            for m in pattern.find_iter(text) {
                let flag = m.as_str().to_string();
                if !found.contains(&flag) {
                    found.push(flag);
                }
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finds_flg_marker() {
        let value = json!({"message": "RAFAL {{FLG:SECRET}} KRAKOW"});
        assert_eq!(scan_flags(&value), vec!["{{FLG:SECRET}}"]);
    }

    #[test]
    fn test_finds_nested_and_case_insensitive() {
        let value = json!({"data": {"hint": ["nothing", "FLAG{deep}"]}});
        assert_eq!(scan_flags(&value), vec!["FLAG{deep}"]);
    }

    #[test]
    fn test_deduplicates() {
        let value = json!(["flag{a}", "again flag{a}"]);
        assert_eq!(scan_flags(&value).len(), 1);
    }

    #[test]
    fn test_strip_flags_leaves_names() {
        assert_eq!(
            strip_flags("RAFAL {{FLG:SECRET}} KRAKOW flag{x}").split_whitespace().collect::<Vec<_>>(),
            vec!["RAFAL", "KRAKOW"]
        );
        assert_eq!(strip_flags("BARBARA"), "BARBARA");
    }

    #[test]
    fn test_plain_names_have_no_flags() {
        let value = json!({"message": "BARBARA ALEKSANDER"});
        assert!(scan_flags(&value).is_empty());
    }
}
