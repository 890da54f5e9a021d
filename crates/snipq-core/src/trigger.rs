//! Splitting raw trigger text into a base trigger and inline parameters.
//!
//! `:ty?lang=vi&name=John` under prefix `:` becomes base `ty` with
//! parameters `lang=vi`, `name=John`, in that order.

use crate::error::ExpandError;
use crate::models::{ParamValue, Params};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTrigger {
    pub base: String,
    pub params: Params,
}

/// Parse a raw trigger under the configured prefix
pub fn parse_trigger(raw: &str, prefix: &str) -> Result<ParsedTrigger, ExpandError> {
    let raw = raw.trim();
    let (head, query) = match raw.split_once('?') {
        Some((head, query)) => (head, Some(query)),
        None => (raw, None),
    };

    let base = strip_prefix(head.trim_end(), prefix).to_string();
    let params = match query {
        Some(query) => parse_query(query)?,
        None => Params::new(),
    };

    Ok(ParsedTrigger { base, params })
}

/// Strip the prefix once, leaving text without it untouched
pub fn strip_prefix<'a>(trigger: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return trigger;
    }
    trigger.strip_prefix(prefix).unwrap_or(trigger)
}

/// A trigger is usable when non-empty and free of whitespace
pub fn validate_trigger(trigger: &str) -> bool {
    !trigger.is_empty() && !trigger.chars().any(char::is_whitespace)
}

fn parse_query(query: &str) -> Result<Params, ExpandError> {
    let mut params = Params::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode(key)?;
        if key.is_empty() {
            continue;
        }
        params.insert(key, percent_decode(value)?);
    }
    Ok(params)
}

/// Decode `%XX` escapes and `+` as space, rejecting dangling or bad escapes
pub fn percent_decode(input: &str) -> Result<String, ExpandError> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_value);
                let lo = bytes.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => decoded.push(hi << 4 | lo),
                    _ if i + 2 >= bytes.len() => {
                        return Err(ExpandError::malformed(input, "incomplete percent escape"))
                    }
                    _ => return Err(ExpandError::malformed(input, "invalid percent escape")),
                }
                i += 3;
            }
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded)
        .map_err(|_| ExpandError::malformed(input, "decoded bytes are not valid UTF-8"))
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Validate a JSON parameter map arriving from outside the process
pub fn params_from_json(
    map: &serde_json::Map<String, serde_json::Value>,
) -> Result<Params, ExpandError> {
    let mut params = Params::new();
    for (key, value) in map {
        let value = ParamValue::from_json(key, value)?;
        params.insert(key.clone(), value.to_string());
    }
    Ok(params)
}

/// Overlay `explicit` onto `base`; explicit values win, new keys append
pub fn merge_params(mut base: Params, explicit: &Params) -> Params {
    for (key, value) in explicit.iter() {
        base.insert(key, value);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(parsed: &ParsedTrigger) -> Vec<(&str, &str)> {
        parsed.params.iter().collect()
    }

    #[test]
    fn simple_trigger() {
        let parsed = parse_trigger(":ty", ":").unwrap();
        assert_eq!(parsed.base, "ty");
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn params_keep_appearance_order() {
        let parsed = parse_trigger(":ty?lang=vi&tone=casual&name=John", ":").unwrap();
        assert_eq!(parsed.base, "ty");
        assert_eq!(
            pairs(&parsed),
            vec![("lang", "vi"), ("tone", "casual"), ("name", "John")]
        );
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let parsed = parse_trigger(":ty?lang=en&x=1&lang=vi", ":").unwrap();
        assert_eq!(pairs(&parsed), vec![("lang", "vi"), ("x", "1")]);
    }

    #[test]
    fn key_without_equals_is_empty() {
        let parsed = parse_trigger(":date?format=&loud", ":").unwrap();
        assert_eq!(pairs(&parsed), vec![("format", ""), ("loud", "")]);
    }

    #[test]
    fn decodes_keys_and_values() {
        let parsed = parse_trigger(":date?format=Mon%2C%2002%20Jan%202006&first+name=A+B", ":")
            .unwrap();
        assert_eq!(parsed.params.get("format"), Some("Mon, 02 Jan 2006"));
        assert_eq!(parsed.params.get("first name"), Some("A B"));
    }

    #[test]
    fn decodes_multibyte_utf8() {
        let parsed = parse_trigger(":hi?name=Ch%C3%A0o", ":").unwrap();
        assert_eq!(parsed.params.get("name"), Some("Chào"));
    }

    #[test]
    fn malformed_escapes_fail() {
        for raw in [":x?a=%", ":x?a=%4", ":x?a=%zz", ":x?%=1", ":x?a=%FF"] {
            let err = parse_trigger(raw, ":").unwrap_err();
            assert_eq!(err.kind(), "MalformedParameter", "{}", raw);
        }
    }

    #[test]
    fn prefix_is_optional_and_stripped_once() {
        assert_eq!(parse_trigger("hello", ":").unwrap().base, "hello");
        assert_eq!(parse_trigger("::hello", ":").unwrap().base, ":hello");
        assert_eq!(parse_trigger("  :hello  ", ":").unwrap().base, "hello");
        assert_eq!(parse_trigger(";;sig", ";;").unwrap().base, "sig");
    }

    #[test]
    fn splits_on_first_question_mark_only() {
        let parsed = parse_trigger(":q?text=why?&n=1", ":").unwrap();
        assert_eq!(parsed.params.get("text"), Some("why?"));
    }

    #[test]
    fn validates_triggers() {
        assert!(validate_trigger(":ty"));
        assert!(validate_trigger("@hello"));
        assert!(!validate_trigger(""));
        assert!(!validate_trigger(":hello world"));
        assert!(!validate_trigger(":hello\tworld"));
    }

    #[test]
    fn json_params_merge_over_inline() {
        let inline = parse_trigger(":ty?lang=en&tone=warm", ":").unwrap().params;
        let json = serde_json::json!({"lang": "vi", "count": 2, "loud": true});
        let explicit = params_from_json(json.as_object().unwrap()).unwrap();
        let merged = merge_params(inline, &explicit);
        assert_eq!(merged.get("lang"), Some("vi"));
        assert_eq!(merged.get("tone"), Some("warm"));
        assert_eq!(merged.get("count"), Some("2"));
        assert_eq!(merged.get("loud"), Some("true"));
    }
}
