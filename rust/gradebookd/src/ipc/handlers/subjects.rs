use serde_json::json;

use crate::calc;
use crate::error::{GradebookError, Result};
use crate::input::SubjectDraft;
use crate::ipc::error::respond;
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::model::{Assessment, Subject};
use crate::store::{PendingDelete, Removed};

fn subject_json(subject: &Subject) -> serde_json::Value {
    let grade = calc::composite_grade(subject);
    json!({
        "subject": subject,
        "grade": grade,
        "gradeDisplay": calc::format_grade(grade),
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let student_id = helpers::student_param(&state.book, &req.params)?;
    let draft = SubjectDraft::from_params(&req.params)?;
    let subject = state.book.add_subject(&student_id, draft)?;
    tracing::info!(student_id = %student_id, subject_id = %subject.id, "subject added");
    Ok(subject_json(subject))
}

fn handle_delete_request(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let student_id = helpers::student_param(&state.book, &req.params)?;
    let Some(subject_id) = helpers::subject_param(&state.book, &student_id, &req.params)? else {
        return Ok(json!({ "pending": null }));
    };
    state.book.request_delete_subject(&student_id, &subject_id)?;
    Ok(json!({ "pending": state.book.pending() }))
}

fn handle_delete_confirm(state: &mut AppState) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    if !matches!(state.book.pending(), Some(PendingDelete::Subject { .. })) {
        return Ok(json!({ "removed": false }));
    }
    match state.book.confirm_delete() {
        Some(Removed::Subject(s)) => {
            tracing::info!(subject_id = %s.id, "subject deleted");
            Ok(json!({ "removed": true, "subjectId": s.id }))
        }
        _ => Ok(json!({ "removed": false })),
    }
}

fn handle_delete_cancel(state: &mut AppState) -> Result<serde_json::Value> {
    let cancelled = match state.book.pending() {
        Some(PendingDelete::Subject { .. }) => state.book.cancel_delete().is_some(),
        _ => false,
    };
    Ok(json!({ "cancelled": cancelled }))
}

fn handle_update_score(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let student_id = helpers::student_param(&state.book, &req.params)?;
    let raw = helpers::required_str(&req.params, "assessment")?;
    let assessment = Assessment::parse(raw).ok_or_else(|| {
        GradebookError::bad_params(
            "assessment must be one of: assignments, quizzes, projects, exams",
        )
    })?;
    let Some(subject_id) = helpers::subject_param(&state.book, &student_id, &req.params)? else {
        return Ok(json!({ "updated": false }));
    };
    let value = req.params.get("value").cloned().unwrap_or(serde_json::Value::Null);
    let subject = state
        .book
        .edit_score(&student_id, &subject_id, assessment, &value)?;
    let mut out = subject_json(subject);
    out["updated"] = json!(true);
    Ok(out)
}

fn handle_update_feedback(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let student_id = helpers::student_param(&state.book, &req.params)?;
    let feedback = req
        .params
        .get("feedback")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let Some(subject_id) = helpers::subject_param(&state.book, &student_id, &req.params)? else {
        return Ok(json!({ "updated": false }));
    };
    let subject = state
        .book
        .edit_feedback(&student_id, &subject_id, &feedback)?;
    let mut out = subject_json(subject);
    out["updated"] = json!(true);
    Ok(out)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "subjects.create" => handle_create(state, req),
        "subjects.deleteRequest" => handle_delete_request(state, req),
        "subjects.deleteConfirm" => handle_delete_confirm(state),
        "subjects.deleteCancel" => handle_delete_cancel(state),
        "subjects.updateScore" => handle_update_score(state, req),
        "subjects.updateFeedback" => handle_update_feedback(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
