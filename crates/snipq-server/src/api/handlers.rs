//! Request handlers. Each one reads the shared expansion service and builds
//! an [`ApiResponse`]; routing lives in `server::http_server`.

use super::models::{ApiResponse, ExpandRequest, PreviewRequest};
use chrono::Utc;
use serde_json::{Map, Value};
use snipq_core::{
    load_vault, params_from_json, ExpandContext, ExpandError, ExpansionService, Group,
    HistoryEntry, Params, Rendered, Snippet, VariableContext, VaultInfo,
};
use std::path::Path;
use tracing::{info, warn};

pub fn get_groups(service: &ExpansionService) -> ApiResponse<Vec<Group>> {
    ApiResponse::success(service.groups())
}

pub fn get_snippets(service: &ExpansionService, group_id: &str) -> ApiResponse<Vec<Snippet>> {
    ApiResponse::success(service.snippets(group_id))
}

pub fn get_vault_info(service: &ExpansionService) -> ApiResponse<VaultInfo> {
    ApiResponse::success(service.vault_info())
}

pub fn get_history(service: &ExpansionService) -> ApiResponse<Vec<HistoryEntry>> {
    ApiResponse::success(service.history())
}

pub fn search_snippets(service: &ExpansionService, query: &str) -> ApiResponse<Vec<Snippet>> {
    ApiResponse::success(service.search(query))
}

/// Drop every recorded expansion
pub fn clear_history_handler(service: &ExpansionService) -> ApiResponse<usize> {
    let cleared = service.history().len();
    service.clear_history();
    info!(cleared, "History cleared");
    ApiResponse::success(cleared)
}

pub fn expand_handler(service: &ExpansionService, request: ExpandRequest) -> ApiResponse<Rendered> {
    let result = explicit_params(request.params.as_ref()).and_then(|params| {
        let mut variables = VariableContext::new(Utc::now());
        variables.app_id = request.app_id.clone();
        variables.clipboard = request.clipboard.clone();

        let mut context = ExpandContext::new(variables);
        context.capture = request.capture();
        context.strict_boundaries = request.strict_boundaries;

        service.expand_with(&request.trigger, &context, &params)
    });
    if let Err(e) = &result {
        info!(trigger = %request.trigger, kind = e.kind(), "Expansion refused");
    }
    result.into()
}

pub fn preview_handler(service: &ExpansionService, request: PreviewRequest) -> ApiResponse<String> {
    explicit_params(request.params.as_ref())
        .and_then(|params| {
            let context = ExpandContext::new(VariableContext::new(Utc::now()));
            service.preview_with(&request.trigger, &context, &params)
        })
        .into()
}

/// Re-read the vault file and publish it
pub fn reload_handler(service: &ExpansionService, vault_path: &Path) -> ApiResponse<VaultInfo> {
    match load_vault(vault_path).and_then(|vault| service.publish(vault)) {
        Ok(()) => ApiResponse::success(service.vault_info()),
        Err(e) => {
            warn!(path = %vault_path.display(), error = %e, "Vault reload failed");
            ApiResponse::error(e.to_string())
        }
    }
}

fn explicit_params(map: Option<&Map<String, Value>>) -> Result<Params, ExpandError> {
    match map {
        Some(map) => params_from_json(map),
        None => Ok(Params::new()),
    }
}
