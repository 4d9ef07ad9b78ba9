use serde_json::json;
use std::path::PathBuf;

use crate::backup;
use crate::error::{GradebookError, Result};
use crate::ipc::error::respond;
use crate::ipc::handlers::core::open_workspace;
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};

fn workspace_param(state: &AppState, req: &Request) -> Result<PathBuf> {
    if let Some(p) = helpers::optional_str(&req.params, "workspacePath") {
        return Ok(PathBuf::from(p));
    }
    state.workspace.clone().ok_or(GradebookError::NoWorkspace)
}

fn handle_export(state: &AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let workspace = workspace_param(state, req)?;
    let out = PathBuf::from(helpers::required_str(&req.params, "outPath")?);
    let summary = backup::export_workspace_bundle(&workspace, &out)?;
    tracing::info!(out = %out.to_string_lossy(), "workspace bundle exported");
    Ok(json!({
        "outPath": out.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "dbSha256": summary.db_sha256,
    }))
}

fn handle_import(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let workspace = workspace_param(state, req)?;
    let in_path = PathBuf::from(helpers::required_str(&req.params, "inPath")?);

    let reopen = state.workspace.as_deref() == Some(workspace.as_path());
    if reopen {
        // Release the live connection before the database file is replaced.
        state.db = None;
    }
    let imported = backup::import_workspace_bundle(&in_path, &workspace);
    let reopened = if reopen {
        let session = state.session.clone();
        let v = open_workspace(state, &workspace)?;
        state.session = session;
        helpers::persist_session(state)?;
        Some(v)
    } else {
        None
    };
    let summary = imported?;
    tracing::info!(workspace = %workspace.to_string_lossy(), "workspace bundle imported");
    Ok(json!({
        "workspacePath": workspace.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "dbSha256": summary.db_sha256,
        "reopened": reopened,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.exportWorkspaceBundle" => handle_export(state, req),
        "backup.importWorkspaceBundle" => handle_import(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
