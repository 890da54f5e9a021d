use crate::error::{Result, SnipqError};
use crate::variables::VariableContext;
use arboard::Clipboard;
use chrono::Utc;
use tracing::debug;

/// Get the current clipboard content as text
pub fn get_clipboard_text() -> Result<String> {
    let mut clipboard = Clipboard::new().map_err(|e| SnipqError::Clipboard(e.to_string()))?;
    clipboard
        .get_text()
        .map_err(|e| SnipqError::Clipboard(e.to_string()))
}

/// Capture a variable context from the running system.
///
/// The clipboard is optional: headless sessions and non-text contents simply
/// leave `{{clipboard}}` unbound.
pub fn system_context(app_id: Option<&str>) -> VariableContext {
    let mut context = VariableContext::new(Utc::now());
    context.app_id = app_id.map(str::to_string);
    context.clipboard = match get_clipboard_text() {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(error = %e, "Clipboard unavailable");
            None
        }
    };
    context
}
