mod backup;
mod calc;
mod chart;
mod db;
mod error;
mod input;
mod ipc;
mod loader;
mod model;
mod session;
mod store;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gradebookd")]
#[command(about = "Grade tracking sidecar speaking newline-delimited JSON over stdio")]
struct Cli {
    /// Workspace directory to open at startup
    #[arg(long, env = "GRADEBOOK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Student document to load at startup
    #[arg(long, env = "GRADEBOOK_DOCUMENT")]
    document: Option<PathBuf>,

    /// Give up on the document load after this many milliseconds
    #[arg(long, env = "GRADEBOOK_LOAD_TIMEOUT_MS", default_value_t = loader::DEFAULT_LOAD_TIMEOUT_MS)]
    load_timeout_ms: u64,
}

/// Logs go to stderr; stdout carries the protocol.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "gradebookd=info".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let mut state = ipc::AppState::new(Duration::from_millis(cli.load_timeout_ms));

    if let Some(doc) = cli.document.as_deref() {
        // Failure is recorded in the load state and stays queryable.
        let _ = ipc::load_document(&mut state, doc);
    }
    if let Some(ws) = cli.workspace.as_deref() {
        if let Err(e) = ipc::open_workspace(&mut state, ws) {
            tracing::error!(
                workspace = %ws.to_string_lossy(),
                error = %e,
                "failed to open workspace"
            );
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                if writeln!(stdout, "{}", resp).and_then(|_| stdout.flush()).is_err() {
                    break;
                }
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let text = serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string());
        if writeln!(stdout, "{}", text).and_then(|_| stdout.flush()).is_err() {
            break;
        }
    }
}
