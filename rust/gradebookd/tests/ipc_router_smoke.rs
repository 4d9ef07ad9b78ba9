use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn fixture_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../").join(rel)
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .env_remove("GRADEBOOK_WORKSPACE")
        .env_remove("GRADEBOOK_DOCUMENT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = tempfile::tempdir().expect("temp dir");
    let bundle_out = workspace.path().join("smoke-backup.zip");
    let doc_out = workspace.path().join("smoke-export.json");
    let fixture = fixture_path("fixtures/student.json");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let calls = [
        ("health", json!({})),
        ("workspace.select", json!({ "path": workspace.path().to_string_lossy() })),
        ("document.load", json!({ "path": fixture.to_string_lossy() })),
        ("session.get", json!({})),
        ("session.signup", json!({ "role": "teacher" })),
        ("session.login", json!({ "role": "teacher", "accessCode": "T-0001" })),
        ("document.status", json!({})),
        ("document.export", json!({ "outPath": doc_out.to_string_lossy() })),
        ("session.navigation", json!({})),
        ("students.list", json!({})),
        ("students.filters", json!({ "course": "BSIT" })),
        ("students.select", json!({ "studentId": "1" })),
        ("students.selected", json!({})),
        ("students.create", json!({ "name": "Smoke Student", "course": "BSIT", "block": "C" })),
        ("students.deleteRequest", json!({ "studentId": "4" })),
        ("students.deleteCancel", json!({})),
        ("students.deleteConfirm", json!({})),
        ("subjects.create", json!({ "subject": "Physics", "code": "PHY101" })),
        ("subjects.updateScore", json!({ "index": 0, "assessment": "quizzes", "value": 77 })),
        ("subjects.updateFeedback", json!({ "index": 0, "feedback": "ok" })),
        ("subjects.deleteRequest", json!({ "index": 3 })),
        ("subjects.deleteCancel", json!({})),
        ("subjects.deleteConfirm", json!({})),
        ("grades.student", json!({ "period": "Midterm" })),
        ("grades.subjects", json!({})),
        ("grades.chart", json!({ "chartType": "pie" })),
        ("grades.dashboard", json!({})),
        ("grades.periods", json!({})),
        ("grades.palette", json!({ "count": 12 })),
        ("grades.save", json!({})),
        ("backup.exportWorkspaceBundle", json!({ "outPath": bundle_out.to_string_lossy() })),
        ("backup.importWorkspaceBundle", json!({ "inPath": bundle_out.to_string_lossy() })),
        ("students.clearSelection", json!({})),
        ("session.logout", json!({})),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let id = (i + 1).to_string();
        let resp = request(&mut stdin, &mut reader, &id, method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
    }

    writeln!(
        stdin,
        "{}",
        json!({ "id": "99", "method": "grades.unknownThing", "params": {} })
    )
    .expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let unknown: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(unknown["id"], json!("99"));
    assert_eq!(unknown["ok"], json!(false));
    assert_eq!(unknown["error"]["code"], json!("not_implemented"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_line_gets_bad_json_and_loop_continues() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{ this is not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value["ok"], json!(false));
    assert_eq!(value["error"]["code"], json!("bad_json"));

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["result"]["workspacePath"], json!(null));

    drop(stdin);
    let _ = child.wait();
}
