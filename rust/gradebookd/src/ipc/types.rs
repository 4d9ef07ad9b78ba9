use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use serde::Deserialize;

use crate::loader::LoadState;
use crate::session::Session;
use crate::store::GradeBook;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub book: GradeBook,
    pub session: Session,
    pub load_state: LoadState,
    pub load_timeout: Duration,
}

impl AppState {
    pub fn new(load_timeout: Duration) -> Self {
        Self {
            workspace: None,
            db: None,
            book: GradeBook::default(),
            session: Session::default(),
            load_state: LoadState::default(),
            load_timeout,
        }
    }
}
