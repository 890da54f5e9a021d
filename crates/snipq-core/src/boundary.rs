use crate::config::Settings;
use crate::error::ExpandError;
use serde::{Deserialize, Serialize};

/// Text captured around a live trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
    pub surrounding: String,
    /// Character offset of the trigger inside `surrounding`. When absent the
    /// last occurrence is checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl Capture {
    pub fn new(surrounding: impl Into<String>) -> Self {
        Self {
            surrounding: surrounding.into(),
            offset: None,
        }
    }

    pub fn at(surrounding: impl Into<String>, offset: usize) -> Self {
        Self {
            surrounding: surrounding.into(),
            offset: Some(offset),
        }
    }
}

/// Enforce application exclusion, then word boundaries.
///
/// Without a capture the trigger is treated as isolated, which is how the
/// expand-by-string entry points behave.
pub fn validate(
    raw_trigger: &str,
    capture: Option<&Capture>,
    strict_override: Option<bool>,
    app_id: Option<&str>,
    settings: &Settings,
) -> Result<(), ExpandError> {
    if let Some(app_id) = app_id {
        if settings.is_app_excluded(app_id) {
            return Err(ExpandError::AppExcluded(app_id.to_string()));
        }
    }

    let strict = strict_override.unwrap_or(settings.strict_boundaries);
    match capture {
        Some(capture) if strict => check_boundaries(raw_trigger.trim(), capture),
        _ => Ok(()),
    }
}

fn check_boundaries(trigger: &str, capture: &Capture) -> Result<(), ExpandError> {
    let text: Vec<char> = capture.surrounding.chars().collect();
    let needle: Vec<char> = trigger.chars().collect();
    let violation = || ExpandError::BoundaryViolation(trigger.to_string());

    if needle.is_empty() {
        return Err(violation());
    }

    let start = match capture.offset {
        Some(offset) if matches_at(&text, &needle, offset) => offset,
        Some(_) => return Err(violation()),
        None => (0..text.len())
            .rev()
            .find(|&i| matches_at(&text, &needle, i))
            .ok_or_else(violation)?,
    };
    let end = start + needle.len();

    let before_ok = start == 0 || !is_word_char(text[start - 1]);
    let after_ok = end == text.len() || !is_word_char(text[end]);
    if before_ok && after_ok {
        Ok(())
    } else {
        Err(violation())
    }
}

fn matches_at(text: &[char], needle: &[char], at: usize) -> bool {
    at.checked_add(needle.len())
        .and_then(|end| text.get(at..end))
        .is_some_and(|window| window == needle)
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
