use serde_json::json;

use crate::calc::{self, GradingPeriod};
use crate::chart::{self, ChartKind};
use crate::db;
use crate::error::{GradebookError, Result};
use crate::ipc::error::respond;
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::model::{Student, StudentId};

const PALETTE_MAX_COLORS: u64 = 1000;

/// Which student a grade view shows. A student session is pinned to its
/// own record; a teacher names one explicitly or falls back to the selection.
fn resolve_student<'a>(state: &'a AppState, req: &Request) -> Result<&'a Student> {
    let id: StudentId = match helpers::read_scope(state)? {
        Some(own) => match helpers::optional_student_id(&req.params) {
            Some(asked) if asked != own => {
                return Err(GradebookError::Forbidden(
                    "students may only view their own grades".to_string(),
                ));
            }
            _ => own,
        },
        None => helpers::student_param(&state.book, &req.params)?,
    };
    state
        .book
        .student(&id)
        .ok_or_else(|| GradebookError::NotFound(format!("student {}", id)))
}

fn period_param(req: &Request) -> Result<GradingPeriod> {
    match helpers::optional_str(&req.params, "period") {
        None => Ok(GradingPeriod::Prelim),
        Some(raw) => GradingPeriod::parse(raw).ok_or_else(|| {
            GradebookError::bad_params("period must be one of: Prelim, Midterm, Pre-Finals, Finals")
        }),
    }
}

fn kind_param(req: &Request, default: ChartKind) -> Result<ChartKind> {
    match helpers::optional_str(&req.params, "chartType") {
        None => Ok(default),
        Some(raw) => ChartKind::parse(raw).ok_or_else(|| {
            GradebookError::bad_params("chartType must be one of: pie, doughnut, bar, line")
        }),
    }
}

fn handle_student(state: &AppState, req: &Request) -> Result<serde_json::Value> {
    let student = resolve_student(state, req)?;
    let report = calc::student_report(student, period_param(req)?);
    Ok(serde_json::to_value(report).map_err(anyhow::Error::from)?)
}

fn handle_subjects(state: &AppState, req: &Request) -> Result<serde_json::Value> {
    let student = resolve_student(state, req)?;
    let kind = kind_param(req, ChartKind::Doughnut)?;
    let cards: Vec<serde_json::Value> = student
        .subjects
        .iter()
        .map(|s| {
            let breakdown = calc::subject_breakdown(s);
            let chart = chart::breakdown_chart(&breakdown, kind);
            json!({ "breakdown": breakdown, "chart": chart })
        })
        .collect();
    Ok(json!({
        "studentId": student.id,
        "name": student.name,
        "subjects": cards,
    }))
}

fn handle_chart(state: &AppState, req: &Request) -> Result<serde_json::Value> {
    let student = resolve_student(state, req)?;
    let kind = kind_param(req, ChartKind::Doughnut)?;
    let points: Vec<(String, f64)> = student
        .subjects
        .iter()
        .map(|s| (s.subject.clone(), calc::composite_grade(s)))
        .collect();
    let with_center = req
        .params
        .get("withCenter")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    let center = if with_center {
        calc::overall_average(&student.subjects)
    } else {
        None
    };
    Ok(serde_json::to_value(chart::project(&points, kind, center)).map_err(anyhow::Error::from)?)
}

fn handle_dashboard(state: &AppState, req: &Request) -> Result<serde_json::Value> {
    let scope = helpers::read_scope(state)?;
    let course = helpers::optional_str(&req.params, "course");
    let block = helpers::optional_str(&req.params, "block");
    let rows = calc::dashboard_rows(
        state
            .book
            .filtered(course, block)
            .filter(|s| scope.as_ref().map_or(true, |own| &s.id == own)),
    );
    let points: Vec<(String, f64)> = rows
        .iter()
        .filter_map(|r| r.overall_average.map(|avg| (r.name.clone(), avg)))
        .collect();
    let kind = kind_param(req, ChartKind::Bar)?;
    Ok(json!({
        "rows": rows,
        "chart": chart::project(&points, kind, None),
    }))
}

fn handle_periods() -> serde_json::Value {
    let periods: Vec<serde_json::Value> = GradingPeriod::ALL
        .into_iter()
        .map(|p| json!({ "label": p.label(), "heading": p.heading() }))
        .collect();
    json!({ "periods": periods })
}

fn handle_palette(req: &Request) -> Result<serde_json::Value> {
    let count = req
        .params
        .get("count")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| GradebookError::bad_params("count must be a non-negative integer"))?;
    if count > PALETTE_MAX_COLORS {
        return Err(GradebookError::bad_params(format!(
            "count must be <= {}",
            PALETTE_MAX_COLORS
        )));
    }
    Ok(serde_json::to_value(chart::palette(count as usize)).map_err(anyhow::Error::from)?)
}

/// Commit boundary: persist the whole directory to the workspace.
fn handle_save(state: &mut AppState) -> Result<serde_json::Value> {
    helpers::require_teacher(state)?;
    let Some(conn) = state.db.as_mut() else {
        return Err(GradebookError::NoWorkspace);
    };
    let info = db::save_snapshot(conn, state.book.students())?;
    state.book.mark_committed();
    tracing::info!(
        commit_id = %info.id,
        students = info.student_count,
        subjects = info.subject_count,
        "grades saved"
    );
    Ok(json!({
        "commitId": info.id,
        "committedAt": info.committed_at,
        "studentCount": info.student_count,
        "subjectCount": info.subject_count,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "grades.student" => handle_student(state, req),
        "grades.subjects" => handle_subjects(state, req),
        "grades.chart" => handle_chart(state, req),
        "grades.dashboard" => handle_dashboard(state, req),
        "grades.periods" => Ok(handle_periods()),
        "grades.palette" => handle_palette(req),
        "grades.save" => handle_save(state),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
