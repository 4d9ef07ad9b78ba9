use serde_json::json;

use crate::error::{GradebookError, Result};
use crate::ipc::error::respond;
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::model::StudentId;
use crate::session::{Role, View};

fn session_json(state: &AppState) -> serde_json::Value {
    json!({
        "role": state.session.role,
        "studentId": state.session.student_id,
        "navigation": state.session.navigation(),
    })
}

fn role_param(req: &Request) -> Result<Role> {
    let raw = helpers::required_str(&req.params, "role")?;
    Role::parse(raw)
        .ok_or_else(|| GradebookError::bad_params("role must be one of: student, teacher"))
}

fn linked_student(state: &AppState, req: &Request) -> Result<Option<StudentId>> {
    let Some(id) = helpers::optional_student_id(&req.params) else {
        return Ok(None);
    };
    if state.book.student(&id).is_none() {
        return Err(GradebookError::NotFound(format!("student {}", id)));
    }
    Ok(Some(id))
}

fn handle_login(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    let role = role_param(req)?;
    let student_id = linked_student(state, req)?;
    state
        .session
        .login(role, helpers::optional_str(&req.params, "accessCode"), student_id)?;
    helpers::persist_session(state)?;
    tracing::info!(role = ?role, "logged in");
    Ok(session_json(state))
}

fn handle_signup(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    let role = role_param(req)?;
    let student_id = linked_student(state, req)?;
    state.session.signup(role, student_id);
    helpers::persist_session(state)?;
    tracing::info!(role = ?role, "signed up");
    Ok(session_json(state))
}

fn handle_logout(state: &mut AppState) -> Result<serde_json::Value> {
    state.session.logout();
    helpers::persist_session(state)?;
    tracing::info!("logged out");
    Ok(session_json(state))
}

fn handle_navigation(state: &AppState) -> serde_json::Value {
    let views = [
        View::Dashboard,
        View::StudentGrades,
        View::SubjectGrades,
        View::TeacherGrading,
        View::Login,
        View::Signup,
    ];
    let access: Vec<serde_json::Value> = views
        .into_iter()
        .map(|v| json!({ "view": v, "allowed": state.session.can_access(v) }))
        .collect();
    json!({
        "items": state.session.navigation(),
        "views": access,
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "session.get" => Ok(session_json(state)),
        "session.login" => handle_login(state, req),
        "session.signup" => handle_signup(state, req),
        "session.logout" => handle_logout(state),
        "session.navigation" => Ok(handle_navigation(state)),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
