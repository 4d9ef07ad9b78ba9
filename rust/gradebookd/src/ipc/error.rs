use serde_json::json;

use crate::error::GradebookError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn err_from(id: &str, e: &GradebookError) -> serde_json::Value {
    err(id, e.code(), e.to_string(), e.details())
}

/// Collapse a handler result into a response envelope.
pub fn respond(id: &str, result: crate::error::Result<serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => {
            tracing::debug!(code = e.code(), error = %e, "request failed");
            err_from(id, &e)
        }
    }
}
