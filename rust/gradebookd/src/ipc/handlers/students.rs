use serde_json::json;

use crate::calc;
use crate::error::Result;
use crate::input::StudentDraft;
use crate::ipc::error::respond;
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::{PendingDelete, Removed};

fn handle_list(state: &AppState, req: &Request) -> Result<serde_json::Value> {
    let scope = helpers::read_scope(state)?;
    let course = helpers::optional_str(&req.params, "course");
    let block = helpers::optional_str(&req.params, "block");
    let students: Vec<serde_json::Value> = state
        .book
        .filtered(course, block)
        .filter(|s| scope.as_ref().map_or(true, |own| &s.id == own))
        .map(|s| {
            json!({
                "id": s.id,
                "name": s.name,
                "course": s.course,
                "block": s.block,
                "subjectCount": s.subjects.len(),
                "overallAverage": calc::overall_average(&s.subjects),
            })
        })
        .collect();
    Ok(json!({
        "students": students,
        "selectedId": state.book.selected_id(),
    }))
}

fn handle_filters(state: &AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let blocks = helpers::optional_str(&req.params, "course")
        .map(|c| state.book.blocks(c))
        .unwrap_or_default();
    Ok(json!({
        "courses": state.book.courses(),
        "blocks": blocks,
    }))
}

fn handle_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let id = helpers::student_param(&state.book, &req.params)?;
    let student = state.book.select(&id)?;
    Ok(json!({ "student": student }))
}

fn handle_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let draft = StudentDraft::from_params(&req.params)?;
    let student = state.book.add_student(draft)?;
    tracing::info!(student_id = %student.id, "student added");
    Ok(json!({ "studentId": student.id, "student": student }))
}

fn handle_delete_request(state: &mut AppState, req: &Request) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let id = helpers::student_param(&state.book, &req.params)?;
    state.book.request_delete_student(&id)?;
    Ok(json!({ "pending": state.book.pending() }))
}

fn handle_delete_confirm(state: &mut AppState) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    if !matches!(state.book.pending(), Some(PendingDelete::Student { .. })) {
        return Ok(json!({ "removed": false }));
    }
    match state.book.confirm_delete() {
        Some(Removed::Student(s)) => {
            tracing::info!(student_id = %s.id, "student deleted");
            Ok(json!({
                "removed": true,
                "studentId": s.id,
                "selectedId": state.book.selected_id(),
            }))
        }
        _ => Ok(json!({ "removed": false })),
    }
}

fn handle_delete_cancel(state: &mut AppState) -> Result<serde_json::Value> {
    let cancelled = match state.book.pending() {
        Some(PendingDelete::Student { .. }) => state.book.cancel_delete().is_some(),
        _ => false,
    };
    Ok(json!({ "cancelled": cancelled }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_list(state, req),
        "students.filters" => handle_filters(state, req),
        "students.select" => handle_select(state, req),
        "students.clearSelection" => helpers::require_teacher(state).map(|_| {
            state.book.clear_selection();
            json!({ "selectedId": null })
        }),
        "students.selected" => helpers::require_teacher(state)
            .map(|_| json!({ "student": state.book.selected() })),
        "students.create" => handle_create(state, req),
        "students.deleteRequest" => handle_delete_request(state, req),
        "students.deleteConfirm" => handle_delete_confirm(state),
        "students.deleteCancel" => handle_delete_cancel(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
