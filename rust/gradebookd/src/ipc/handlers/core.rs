use anyhow::Context;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::db;
use crate::error::Result;
use crate::ipc::error::{ok, respond};
use crate::ipc::helpers::{self, SESSION_SETTING};
use crate::ipc::types::{AppState, Request};
use crate::loader::{self, LoadState};
use crate::model::StudentDocument;
use crate::session::Session;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Open (or create) a workspace. A committed snapshot in the workspace
/// replaces the in-memory directory; the stored session is restored.
pub fn open_workspace(state: &mut AppState, path: &Path) -> Result<serde_json::Value> {
    let conn = db::open_db(path)?;

    let session = match db::settings_get_json(&conn, SESSION_SETTING)? {
        Some(v) => serde_json::from_value::<Session>(v).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable stored session");
            Session::default()
        }),
        None => Session::default(),
    };

    let restored = match db::last_commit(&conn)? {
        Some(commit) => {
            let students = db::load_snapshot(&conn)?;
            tracing::info!(
                students = students.len(),
                committed_at = %commit.committed_at,
                "restored committed grades"
            );
            state.book.replace(StudentDocument { students });
            state.load_state = LoadState::Loaded {
                student_count: state.book.students().len(),
                source: path.join(db::DB_FILE).to_string_lossy().to_string(),
            };
            true
        }
        None => false,
    };

    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.session = session;
    Ok(json!({
        "workspacePath": path.to_string_lossy(),
        "restored": restored,
        "role": state.session.role,
    }))
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = helpers::required_str(&req.params, "path")
        .map(PathBuf::from)
        .and_then(|path| open_workspace(state, &path));
    respond(&req.id, result)
}

/// Load the static document. On failure the directory falls back to empty
/// and the failure stays visible through `document.status`.
pub fn load_document(state: &mut AppState, path: &Path) -> Result<serde_json::Value> {
    let source = path.to_string_lossy().to_string();
    match loader::load_document(path, state.load_timeout) {
        Ok(doc) => {
            let count = doc.students.len();
            state.book.replace(doc);
            state.load_state = LoadState::Loaded {
                student_count: count,
                source,
            };
            tracing::info!(students = count, "student document loaded");
            Ok(json!({ "studentCount": count }))
        }
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "failed to load student document");
            state.book.replace(StudentDocument::default());
            state.load_state = LoadState::Failed {
                source,
                message: e.to_string(),
            };
            Err(e)
        }
    }
}

fn handle_document_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = helpers::required_str(&req.params, "path")
        .map(PathBuf::from)
        .and_then(|path| load_document(state, &path));
    respond(&req.id, result)
}

fn handle_document_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| -> Result<serde_json::Value> {
        let last_commit = match state.db.as_ref() {
            Some(conn) => db::last_commit(conn)?.map(|c| {
                json!({
                    "id": c.id,
                    "committedAt": c.committed_at,
                    "studentCount": c.student_count,
                    "subjectCount": c.subject_count,
                })
            }),
            None => None,
        };
        Ok(json!({
            "load": state.load_state,
            "studentCount": state.book.students().len(),
            "dirty": state.book.is_dirty(),
            "lastCommit": last_commit,
        }))
    })();
    respond(&req.id, result)
}

fn handle_document_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| -> Result<serde_json::Value> {
        helpers::require_teacher(state)?;
        let out = PathBuf::from(helpers::required_str(&req.params, "outPath")?);
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
        }
        let doc = state.book.to_document();
        let text = serde_json::to_string_pretty(&doc).map_err(anyhow::Error::from)?;
        std::fs::write(&out, text)
            .with_context(|| format!("failed to write {}", out.to_string_lossy()))?;
        Ok(json!({
            "outPath": out.to_string_lossy(),
            "studentCount": doc.students.len(),
        }))
    })();
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "document.load" => Some(handle_document_load(state, req)),
        "document.status" => Some(handle_document_status(state, req)),
        "document.export" => Some(handle_document_export(state, req)),
        _ => None,
    }
}
