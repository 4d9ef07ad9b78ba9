use serde_json::Value;

use crate::db;
use crate::error::{GradebookError, Result};
use crate::ipc::types::AppState;
use crate::model::{id_text, StudentId, SubjectId};
use crate::session::Role;
use crate::store::GradeBook;

pub const SESSION_SETTING: &str = "session";

pub fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| GradebookError::bad_params(format!("missing {}", key)))
}

/// Trimmed, non-empty string param.
pub fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn optional_student_id(params: &Value) -> Option<StudentId> {
    params
        .get("studentId")
        .and_then(id_text)
        .map(|s| StudentId::from(s.as_str()))
}

/// `params.studentId`, falling back to the current selection.
pub fn student_param(book: &GradeBook, params: &Value) -> Result<StudentId> {
    if let Some(id) = optional_student_id(params) {
        return Ok(id);
    }
    book.selected_id()
        .cloned()
        .ok_or_else(|| GradebookError::bad_params("missing studentId and no student selected"))
}

/// `params.subjectId`, or `params.index` resolved against the current list.
/// An out-of-range index resolves to `None`.
pub fn subject_param(
    book: &GradeBook,
    student_id: &StudentId,
    params: &Value,
) -> Result<Option<SubjectId>> {
    if let Some(id) = params.get("subjectId").and_then(id_text) {
        return Ok(Some(SubjectId::from(id.as_str())));
    }
    match params.get("index") {
        Some(v) => {
            let Some(idx) = v.as_u64() else {
                return Err(GradebookError::bad_params("index must be a non-negative integer"));
            };
            Ok(book.subject_id_at(student_id, idx as usize))
        }
        None => Err(GradebookError::bad_params("missing subjectId or index")),
    }
}

pub fn require_teacher(state: &AppState) -> Result<()> {
    state.session.require(Role::Teacher)
}

/// Which records the session may read: `None` for every student (teacher),
/// `Some(id)` for a student's own record only.
pub fn read_scope(state: &AppState) -> Result<Option<StudentId>> {
    match state.session.role {
        Some(Role::Teacher) => Ok(None),
        Some(Role::Student) => state.session.student_id.clone().map(Some).ok_or_else(|| {
            GradebookError::Forbidden("student session is not linked to a record".to_string())
        }),
        None => Err(GradebookError::Forbidden("log in first".to_string())),
    }
}

/// Mirror the session into the workspace so the role survives restarts.
pub fn persist_session(state: &AppState) -> Result<()> {
    let Some(conn) = state.db.as_ref() else {
        return Ok(());
    };
    if state.session.role.is_none() {
        db::settings_delete(conn, SESSION_SETTING)?;
        return Ok(());
    }
    let v = serde_json::to_value(&state.session).map_err(anyhow::Error::from)?;
    db::settings_set_json(conn, SESSION_SETTING, &v)?;
    Ok(())
}
