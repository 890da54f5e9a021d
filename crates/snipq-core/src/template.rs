//! Template parsing and single-pass rendering.
//!
//! A template is literal text interleaved with `{{name}}` or
//! `{{name|default}}` placeholders. `{{cursor}}` marks the caret position and
//! renders as nothing.
//!
//! Placeholder resolution order:
//! 1. parameter bound for the expansion (trigger or API supplied)
//! 2. the inline `|default` literal
//! 3. the snippet's declared `defaults`
//! 4. a built-in or injected variable
//!
//! Anything still unresolved renders empty, or fails the render when the
//! snippet is strict.

use crate::error::ExpandError;
use crate::models::{ParamValue, Params};
use crate::variables::VariableResolver;
use std::collections::BTreeMap;

pub const CURSOR: &str = "cursor";
const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder {
        name: String,
        default: Option<String>,
    },
    Cursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

/// Everything a render may draw values from
pub struct Bindings<'a> {
    pub params: &'a Params,
    pub defaults: &'a BTreeMap<String, ParamValue>,
    pub variables: &'a VariableResolver<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub text: String,
    pub cursor_offset: usize,
    pub used_params: Params,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, ExpandError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut consumed = 0;

        while let Some(open) = rest.find(OPEN) {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let offset = char_offset(source, consumed + open);
            let body_start = open + OPEN.len();
            let unclosed = || ExpandError::RenderFailure {
                offset,
                reason: "unclosed '{{'".to_string(),
            };
            let close = rest[body_start..].find(CLOSE).ok_or_else(unclosed)?;
            if rest[body_start..body_start + close].contains(OPEN) {
                return Err(unclosed());
            }
            let body = &rest[body_start..body_start + close];
            segments.push(parse_placeholder(body, offset)?);

            let next = body_start + close + CLOSE.len();
            consumed += next;
            rest = &rest[next..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distinct placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder { name, .. } = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn has_cursor(&self) -> bool {
        self.segments.contains(&Segment::Cursor)
    }

    pub fn render(
        &self,
        bindings: &Bindings<'_>,
        strict: bool,
        snippet_id: &str,
    ) -> Result<RenderOutput, ExpandError> {
        let format = bindings
            .params
            .get("format")
            .map(str::to_string)
            .or_else(|| bindings.defaults.get("format").map(ToString::to_string));

        let mut text = String::new();
        let mut written = 0;
        let mut cursor = None;
        let mut used = Params::new();
        let mut missing: Vec<String> = Vec::new();

        for segment in &self.segments {
            let piece = match segment {
                Segment::Literal(literal) => literal.clone(),
                Segment::Cursor => {
                    cursor.get_or_insert(written);
                    continue;
                }
                Segment::Placeholder { name, default } => {
                    match resolve(name, default.as_deref(), bindings, format.as_deref()) {
                        Resolved::Recorded(value) => {
                            if !used.contains_key(name) {
                                used.insert(name.as_str(), value.as_str());
                            }
                            value
                        }
                        Resolved::Literal(value) => value,
                        Resolved::Missing => {
                            if !missing.contains(name) {
                                missing.push(name.clone());
                            }
                            String::new()
                        }
                    }
                }
            };
            written += piece.chars().count();
            text.push_str(&piece);
        }

        if strict && !missing.is_empty() {
            return Err(ExpandError::MissingRequiredPlaceholder {
                snippet: snippet_id.to_string(),
                names: missing,
            });
        }

        for (key, value) in bindings.params.iter() {
            if !used.contains_key(key) {
                used.insert(key, value);
            }
        }

        Ok(RenderOutput {
            text,
            cursor_offset: cursor.unwrap_or(written),
            used_params: used,
        })
    }
}

enum Resolved {
    /// Value came from a binding and is reported in `usedParams`
    Recorded(String),
    /// Inline template default
    Literal(String),
    Missing,
}

fn resolve(
    name: &str,
    inline_default: Option<&str>,
    bindings: &Bindings<'_>,
    format: Option<&str>,
) -> Resolved {
    if let Some(value) = bindings.params.get(name) {
        return Resolved::Recorded(value.to_string());
    }
    if let Some(value) = inline_default {
        return Resolved::Literal(value.to_string());
    }
    if let Some(value) = bindings.defaults.get(name) {
        return Resolved::Recorded(value.to_string());
    }
    match bindings.variables.resolve(name, format) {
        Some(value) => Resolved::Recorded(value),
        None => Resolved::Missing,
    }
}

fn parse_placeholder(body: &str, offset: usize) -> Result<Segment, ExpandError> {
    let (name, default) = match body.split_once('|') {
        Some((name, default)) => (name.trim(), Some(default.to_string())),
        None => (body.trim(), None),
    };
    if name.is_empty() {
        return Err(ExpandError::RenderFailure {
            offset,
            reason: "empty placeholder name".to_string(),
        });
    }
    if name == CURSOR {
        return Ok(Segment::Cursor);
    }
    Ok(Segment::Placeholder {
        name: name.to_string(),
        default,
    })
}

fn char_offset(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].chars().count()
}
