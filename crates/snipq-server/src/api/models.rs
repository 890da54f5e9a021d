//! Data models for API requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use snipq_core::{Capture, ExpandError};

/// Standard API response format
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Stable error kind for expansion failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            code: None,
        }
    }

    pub fn expand_error(err: &ExpandError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            code: Some(err.kind().to_string()),
        }
    }
}

impl<T> From<Result<T, ExpandError>> for ApiResponse<T> {
    fn from(result: Result<T, ExpandError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::expand_error(&e),
        }
    }
}

/// Request model for expanding a trigger
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExpandRequest {
    pub trigger: String,
    pub app_id: Option<String>,
    /// Text around the captured trigger, enables boundary checks
    pub surrounding: Option<String>,
    pub offset: Option<usize>,
    pub strict_boundaries: Option<bool>,
    pub clipboard: Option<String>,
    /// Explicit parameters merged over the trigger's own
    pub params: Option<Map<String, Value>>,
}

impl ExpandRequest {
    pub fn capture(&self) -> Option<Capture> {
        self.surrounding.as_ref().map(|surrounding| Capture {
            surrounding: surrounding.clone(),
            offset: self.offset,
        })
    }
}

/// Request model for previewing a trigger
#[derive(Deserialize, Debug, Default)]
pub struct PreviewRequest {
    pub trigger: String,
    pub params: Option<Map<String, Value>>,
}

/// Query for listing the snippets of one group
#[derive(Deserialize, Debug)]
pub struct SnippetsQuery {
    #[serde(rename = "groupId")]
    pub group_id: String,
}

/// Query for searching snippets by name, trigger or tag
#[derive(Deserialize, Debug, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}
