mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::handle_request;
pub use types::{AppState, Request};

pub use handlers::core::{load_document, open_workspace};
